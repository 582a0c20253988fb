use core::time::Duration;
use std::collections::BTreeMap;
use web_time::Instant;

use crate::*;

/// Identifies one scheduled callback so its owner can cancel it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle {
    due: Instant,
    seq: u64,
}

impl TaskHandle {
    pub fn due(&self) -> Instant {
        self.due
    }
}

/// Single-threaded queue of deferred callbacks.
///
/// Nothing runs on its own: the owner pops due tasks with [`Scheduler::pop_due`]
/// and dispatches them. Tasks due at the same instant come out in the order
/// they were scheduled.
#[derive(Clone, Debug)]
pub struct Scheduler<T> {
    queue: BTreeMap<TaskHandle, T>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule_at(&mut self, due: Instant, task: T) -> TaskHandle {
        let handle = TaskHandle {
            due,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(handle, task);
        handle
    }

    pub fn schedule_after(
        &mut self,
        now: Instant,
        delay: Duration,
        task: T,
    ) -> Result<TaskHandle> {
        Ok(self.schedule_at(due_after(now, delay)?, task))
    }

    /// Removes a pending task, `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.queue.remove(&handle).is_some()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.queue.contains_key(&handle)
    }

    /// Pops the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TaskHandle, T)> {
        match self.queue.first_key_value() {
            Some((handle, _)) if handle.due <= now => self.queue.pop_first(),
            _ => None,
        }
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.queue.first_key_value().map(|(handle, _)| handle.due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// `now + delay`, or [`GameError::DelayOverflow`] when the instant is not
/// representable.
pub fn due_after(now: Instant, delay: Duration) -> Result<Instant> {
    now.checked_add(delay).ok_or(GameError::DelayOverflow(delay))
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order_then_insertion_order() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(t0, Duration::from_millis(20), "late").unwrap();
        scheduler.schedule_after(t0, Duration::from_millis(10), "first").unwrap();
        scheduler.schedule_after(t0, Duration::from_millis(10), "second").unwrap();

        let now = t0 + Duration::from_millis(30);
        let order: Vec<_> = core::iter::from_fn(|| scheduler.pop_due(now))
            .map(|(_, task)| task)
            .collect();

        assert_eq!(order, ["first", "second", "late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn tasks_wait_until_due() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_after(t0, Duration::from_secs(1), ()).unwrap();

        assert_eq!(scheduler.pop_due(t0), None);
        assert_eq!(scheduler.next_due(), Some(handle.due()));
        assert_eq!(
            scheduler.pop_due(t0 + Duration::from_secs(1)),
            Some((handle, ()))
        );
    }

    #[test]
    fn cancelled_task_never_fires() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_after(t0, Duration::from_millis(5), 1).unwrap();
        scheduler.schedule_after(t0, Duration::from_millis(5), 2).unwrap();

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(!scheduler.is_pending(handle));
        assert_eq!(
            scheduler.pop_due(t0 + Duration::from_secs(1)).map(|(_, task)| task),
            Some(2)
        );
    }

    #[test]
    fn unrepresentable_delay_is_an_error() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();

        assert_eq!(
            scheduler.schedule_after(t0, Duration::MAX, ()),
            Err(GameError::DelayOverflow(Duration::MAX))
        );
        assert!(scheduler.is_empty());
    }
}
