use core::time::Duration;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerPhase {
    Stopped,
    Running,
    Paused,
}

impl TimerPhase {
    const fn describe(self) -> &'static str {
        match self {
            Self::Stopped => "the timer is stopped",
            Self::Running => "the timer is running",
            Self::Paused => "the timer is paused",
        }
    }
}

impl Default for TimerPhase {
    fn default() -> Self {
        Self::Stopped
    }
}

/// Scheduled tick of a [`SessionTimer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerTick;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick was stale or the timer is not running.
    Idle,
    Ticked(Duration),
    /// Countdown reached zero, the timer is stopped now.
    Expired,
}

/// Countdown with pause and resume.
///
/// Remaining time is always recomputed from the deadline rather than
/// decremented per tick, so late ticks do not accumulate drift. While running,
/// the effective start of the countdown is `deadline - limit`.
#[derive(Clone, Debug)]
pub struct SessionTimer {
    phase: TimerPhase,
    limit: Duration,
    remaining: Duration,
    tick_interval: Duration,
    deadline: Option<Instant>,
    tick: Option<TaskHandle>,
}

impl SessionTimer {
    pub fn new(limit: Duration, tick_interval: Duration) -> Self {
        Self {
            phase: TimerPhase::Stopped,
            limit,
            remaining: limit,
            tick_interval: tick_interval.max(MIN_TICK_INTERVAL),
            deadline: None,
            tick: None,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Remaining time as of the last tick, pause or stop.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whole seconds left, rounded up so a fresh countdown shows its limit.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining.as_secs() + u64::from(self.remaining.subsec_nanos() > 0)
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn start<T: From<TimerTick>>(
        &mut self,
        limit: Duration,
        now: Instant,
        scheduler: &mut Scheduler<T>,
    ) -> Result<()> {
        self.check_phase(TimerPhase::Stopped, "start the timer")?;

        let deadline = due_after(now, limit)?;
        self.limit = limit;
        self.remaining = limit;
        self.deadline = Some(deadline);
        self.phase = TimerPhase::Running;
        self.schedule_tick(now, scheduler)?;
        log::debug!("Timer started with {:?}", limit);
        Ok(())
    }

    pub fn pause<T>(&mut self, now: Instant, scheduler: &mut Scheduler<T>) -> Result<()> {
        self.check_phase(TimerPhase::Running, "pause the timer")?;

        self.cancel_tick(scheduler);
        self.remaining = self.remaining_at(now);
        self.deadline = None;
        self.phase = TimerPhase::Paused;
        log::debug!("Timer paused with {:?} left", self.remaining);
        Ok(())
    }

    pub fn resume<T: From<TimerTick>>(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler<T>,
    ) -> Result<()> {
        self.check_phase(TimerPhase::Paused, "resume the timer")?;

        self.deadline = Some(due_after(now, self.remaining)?);
        self.phase = TimerPhase::Running;
        self.schedule_tick(now, scheduler)?;
        log::debug!("Timer resumed with {:?} left", self.remaining);
        Ok(())
    }

    /// Halts the countdown keeping the time left.
    pub fn stop<T>(&mut self, now: Instant, scheduler: &mut Scheduler<T>) -> Result<()> {
        if self.phase == TimerPhase::Stopped {
            return Err(GameError::InvalidTransition {
                action: "stop the timer",
                state: self.phase.describe(),
            });
        }

        self.cancel_tick(scheduler);
        if self.phase == TimerPhase::Running {
            self.remaining = self.remaining_at(now);
        }
        self.deadline = None;
        self.phase = TimerPhase::Stopped;
        log::debug!("Timer stopped with {:?} left", self.remaining);
        Ok(())
    }

    pub fn reset<T>(&mut self, limit: Duration, scheduler: &mut Scheduler<T>) {
        self.cancel_tick(scheduler);
        self.limit = limit;
        self.remaining = limit;
        self.deadline = None;
        self.phase = TimerPhase::Stopped;
        log::debug!("Timer reset to {:?}", limit);
    }

    /// Handles a fired [`TimerTick`] identified by its `handle`.
    pub fn on_tick<T: From<TimerTick>>(
        &mut self,
        handle: TaskHandle,
        now: Instant,
        scheduler: &mut Scheduler<T>,
    ) -> TickOutcome {
        if self.tick != Some(handle) || self.phase != TimerPhase::Running {
            log::debug!("Dropping stale timer tick in phase {:?}", self.phase);
            return TickOutcome::Idle;
        }
        self.tick = None;

        self.remaining = self.remaining_at(now);
        if self.remaining.is_zero() {
            self.deadline = None;
            self.phase = TimerPhase::Stopped;
            log::debug!("Timer expired");
            return TickOutcome::Expired;
        }

        if let Err(err) = self.schedule_tick(now, scheduler) {
            log::warn!("Timer tick not rescheduled: {}", err);
        }
        log::trace!("Timer tick, {:?} left", self.remaining);
        TickOutcome::Ticked(self.remaining)
    }

    fn remaining_at(&self, now: Instant) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => self.remaining,
        }
    }

    /// Next tick lands no later than the deadline.
    fn schedule_tick<T: From<TimerTick>>(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler<T>,
    ) -> Result<()> {
        self.cancel_tick(scheduler);
        let delay = self.tick_interval.min(self.remaining_at(now));
        self.tick = Some(scheduler.schedule_after(now, delay, TimerTick.into())?);
        Ok(())
    }

    fn cancel_tick<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(handle) = self.tick.take() {
            scheduler.cancel(handle);
        }
    }

    fn check_phase(&self, expected: TimerPhase, action: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                state: self.phase.describe(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    struct Harness {
        clock: ManualClock,
        timer: SessionTimer,
        scheduler: Scheduler<TimerTick>,
        expired: u32,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                clock: ManualClock::new(),
                timer: SessionTimer::new(60 * SEC, SEC),
                scheduler: Scheduler::new(),
                expired: 0,
            }
        }

        fn start(&mut self, secs: u64) {
            let now = self.clock.now();
            self.timer
                .start(Duration::from_secs(secs), now, &mut self.scheduler)
                .unwrap();
        }

        fn run_due(&mut self) {
            let now = self.clock.now();
            while let Some((handle, TimerTick)) = self.scheduler.pop_due(now) {
                if self.timer.on_tick(handle, now, &mut self.scheduler) == TickOutcome::Expired {
                    self.expired += 1;
                }
            }
        }

        /// Moves time forward one second at a time, firing ticks as they fall due.
        fn advance(&mut self, secs: u64) {
            for _ in 0..secs {
                self.clock.advance(SEC);
                self.run_due();
            }
        }
    }

    #[test]
    fn countdown_pause_resume_expire() {
        let mut h = Harness::new();
        h.start(60);

        h.advance(10);
        assert_eq!(h.timer.remaining(), 50 * SEC);

        h.timer.pause(h.clock.now(), &mut h.scheduler).unwrap();
        assert!(h.scheduler.is_empty());
        h.advance(100);
        assert_eq!(h.timer.remaining(), 50 * SEC);
        assert_eq!(h.timer.phase(), TimerPhase::Paused);

        h.timer.resume(h.clock.now(), &mut h.scheduler).unwrap();
        h.advance(50);
        assert_eq!(h.timer.remaining(), Duration::ZERO);
        assert_eq!(h.expired, 1);
        assert_eq!(h.timer.phase(), TimerPhase::Stopped);

        h.advance(10);
        assert_eq!(h.expired, 1);
        assert!(h.scheduler.is_empty());
    }

    #[test]
    fn late_ticks_recompute_from_elapsed_time() {
        let mut h = Harness::new();
        h.start(60);

        // one tick delivered 7.5 s late
        h.clock.advance(Duration::from_millis(8500));
        h.run_due();

        assert_eq!(h.timer.remaining(), Duration::from_millis(51500));
        assert_eq!(h.timer.remaining_secs(), 52);
        assert_eq!(h.scheduler.len(), 1);
    }

    #[test]
    fn expiry_fires_once_even_when_all_ticks_are_late() {
        let mut h = Harness::new();
        h.start(5);

        h.clock.advance(30 * SEC);
        h.run_due();

        assert_eq!(h.expired, 1);
        assert_eq!(h.timer.remaining(), Duration::ZERO);
    }

    #[test]
    fn pause_keeps_precise_remaining() {
        let mut h = Harness::new();
        h.start(60);

        h.clock.advance(Duration::from_millis(2400));
        h.run_due();
        h.timer.pause(h.clock.now(), &mut h.scheduler).unwrap();

        assert_eq!(h.timer.remaining(), Duration::from_millis(57600));
        assert_eq!(h.timer.remaining_secs(), 58);
    }

    #[test]
    fn invalid_transitions_leave_state_alone() {
        let mut h = Harness::new();
        let now = h.clock.now();

        assert!(h.timer.pause(now, &mut h.scheduler).is_err());
        assert!(h.timer.resume(now, &mut h.scheduler).is_err());
        assert_eq!(h.timer.phase(), TimerPhase::Stopped);

        h.start(60);
        assert!(
            h.timer
                .start(30 * SEC, now, &mut h.scheduler)
                .is_err()
        );
        assert_eq!(h.timer.limit(), 60 * SEC);

        h.timer.pause(now, &mut h.scheduler).unwrap();
        assert_eq!(
            h.timer.pause(now, &mut h.scheduler),
            Err(GameError::InvalidTransition {
                action: "pause the timer",
                state: "the timer is paused",
            })
        );
        assert_eq!(h.timer.phase(), TimerPhase::Paused);
    }

    #[test]
    fn reset_cancels_pending_tick() {
        let mut h = Harness::new();
        h.start(60);
        h.advance(3);

        h.timer.reset(45 * SEC, &mut h.scheduler);

        assert!(h.scheduler.is_empty());
        assert_eq!(h.timer.phase(), TimerPhase::Stopped);
        assert_eq!(h.timer.remaining(), 45 * SEC);
        h.advance(100);
        assert_eq!(h.expired, 0);
    }

    #[test]
    fn stale_tick_is_dropped() {
        let mut h = Harness::new();
        h.start(60);
        h.clock.advance(SEC);
        let now = h.clock.now();
        let (stale, _) = h.scheduler.pop_due(now).unwrap();
        h.timer.on_tick(stale, now, &mut h.scheduler);

        assert_eq!(
            h.timer.on_tick(stale, now, &mut h.scheduler),
            TickOutcome::Idle
        );
        assert_eq!(h.scheduler.len(), 1);
    }

    #[test]
    fn stop_keeps_remaining() {
        let mut h = Harness::new();
        h.start(60);
        h.advance(4);

        h.timer.stop(h.clock.now(), &mut h.scheduler).unwrap();

        assert_eq!(h.timer.remaining(), 56 * SEC);
        assert!(h.scheduler.is_empty());
        assert!(h.timer.stop(h.clock.now(), &mut h.scheduler).is_err());
    }

    #[test]
    fn unrepresentable_limit_does_not_start() {
        let mut h = Harness::new();
        let now = h.clock.now();

        assert_eq!(
            h.timer.start(Duration::MAX, now, &mut h.scheduler),
            Err(GameError::DelayOverflow(Duration::MAX))
        );
        assert_eq!(h.timer.phase(), TimerPhase::Stopped);
        assert_eq!(h.timer.limit(), 60 * SEC);
        assert!(h.scheduler.is_empty());
    }
}
