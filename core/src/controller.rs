use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use web_time::Instant;

use crate::*;

/// Valid transitions:
/// - NotStarted -> Playing
/// - Playing -> Won
/// - Playing -> Lost
/// - Playing -> Playing (reset)
/// - Won | Lost -> Playing (restart)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    NotStarted,
    Playing,
    Won,
    Lost,
}

impl GamePhase {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::NotStarted => "the game has not started",
            Self::Playing => "the game is in progress",
            Self::Won => "the game is won",
            Self::Lost => "the game is lost",
        }
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::NotStarted
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Won,
    Lost,
}

impl From<GameOutcome> for GamePhase {
    fn from(outcome: GameOutcome) -> Self {
        match outcome {
            GameOutcome::Won => Self::Won,
            GameOutcome::Lost => Self::Lost,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    /// Flip animation of `tile` is over. `upgrade` is the partner of a
    /// completed match whose face was already showing as revealed.
    ShowFace {
        tile: TileId,
        upgrade: Option<TileId>,
    },
    ResolveMismatch,
    Tick,
}

impl From<TimerTick> for Task {
    fn from(_: TimerTick) -> Self {
        Self::Tick
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub id: TileId,
    pub state: TileState,
    pub face: Option<Symbol>,
}

/// Everything a presentation needs to redraw from scratch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub board: BoardConfig,
    pub tiles: Vec<TileView>,
    pub moves: u32,
    pub matched_pairs: TileCount,
    pub total_pairs: TileCount,
    pub remaining_secs: u64,
    pub timer: TimerPhase,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub outcome: Option<GameOutcome>,
    pub moves: u32,
    pub matched_tiles: TileCount,
    pub remaining_secs: u64,
}

/// Owns one game: board, match engine, countdown and the deferred callbacks
/// between them.
///
/// The host forwards input through the methods below (or [`Self::handle`])
/// and calls [`Self::advance`] whenever [`Self::next_wakeup`] is reached.
/// Inputs that make no sense in the current phase are dropped silently.
pub struct GameController<G, C, P> {
    config: GameConfig,
    generator: G,
    clock: C,
    presenter: P,
    engine: MatchEngine,
    timer: SessionTimer,
    scheduler: Scheduler<Task>,
    phase: GamePhase,
    pending_faces: SmallVec<[(TaskHandle, TileId); 2]>,
    pending_resolution: Option<TaskHandle>,
}

impl<G: BoardGenerator, C: Clock, P: Presenter> GameController<G, C, P> {
    pub fn new(config: GameConfig, mut generator: G, clock: C, presenter: P) -> Result<Self> {
        let config = config.validate()?;
        let engine = MatchEngine::new(generator.generate(config.board)?);
        let timer = SessionTimer::new(config.time_limit, config.tick_interval);

        Ok(Self {
            config,
            generator,
            clock,
            presenter,
            engine,
            timer,
            scheduler: Scheduler::new(),
            phase: GamePhase::NotStarted,
            pending_faces: SmallVec::new(),
            pending_resolution: None,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// When the next deferred callback falls due.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    /// Runs every deferred callback due by now.
    pub fn advance(&mut self) {
        let now = self.clock.now();
        self.run_due(now);
    }

    pub fn handle(&mut self, event: InputEvent) -> Result<()> {
        use InputEvent::*;

        log::trace!("Input {:?}", event);
        match event {
            TileClicked(tile) => {
                self.reveal(tile)?;
            }
            PointerEnterBoard => {
                self.pointer_enter();
            }
            PointerLeaveBoard => {
                self.pointer_leave();
            }
            StartRequested => {
                self.start();
            }
            ResetRequested => {
                self.reset()?;
            }
            RestartRequested => {
                self.restart()?;
            }
        }
        Ok(())
    }

    pub fn start(&mut self) -> Transition {
        let now = self.clock.now();
        self.run_due(now);
        if let Err(err) = self.check_phase(&[GamePhase::NotStarted], "start") {
            return ignored(err);
        }

        self.begin(now);
        Transition::Applied
    }

    /// Reveals `tile`. Only an unknown tile id is an error; clicks that
    /// cannot be honoured right now come back as [`RevealOutcome::Ignored`].
    pub fn reveal(&mut self, tile: TileId) -> Result<RevealOutcome> {
        let now = self.clock.now();
        self.run_due(now);
        self.engine.grid().position(tile)?;
        if let Err(err) = self.check_phase(&[GamePhase::Playing], "reveal a tile") {
            ignored(err);
            return Ok(RevealOutcome::Ignored);
        }

        let face_due = due_after(now, self.config.reveal_delay)?;
        let outcome = self.engine.reveal(tile)?;
        if !outcome.has_update() {
            return Ok(outcome);
        }

        self.ensure_countdown(now);
        self.presenter.tile_state_changed(tile, TileState::Revealed, None);

        let upgrade = match outcome {
            RevealOutcome::Matched(pair) | RevealOutcome::Won(pair) => pair
                .into_iter()
                .find(|&other| other != tile)
                .filter(|&other| !self.face_pending(other)),
            _ => None,
        };
        let handle = self
            .scheduler
            .schedule_at(face_due, Task::ShowFace { tile, upgrade });
        self.pending_faces.push((handle, tile));

        if outcome.is_won() {
            self.finish(GameOutcome::Won, now);
        }
        Ok(outcome)
    }

    /// Deals a fresh board without leaving the current phase.
    pub fn reset(&mut self) -> Result<Transition> {
        let now = self.clock.now();
        self.run_due(now);
        let resettable = [GamePhase::NotStarted, GamePhase::Playing];
        if let Err(err) = self.check_phase(&resettable, "reset") {
            return Ok(ignored(err));
        }

        self.rebuild()?;
        Ok(Transition::Applied)
    }

    /// New board and a running countdown after the game ended.
    pub fn restart(&mut self) -> Result<Transition> {
        let now = self.clock.now();
        self.run_due(now);
        if let Err(err) = self.check_phase(&[GamePhase::Won, GamePhase::Lost], "restart") {
            return Ok(ignored(err));
        }

        self.rebuild()?;
        self.begin(now);
        Ok(Transition::Applied)
    }

    /// Player engaged with the board again, the countdown continues.
    pub fn pointer_enter(&mut self) -> Transition {
        let now = self.clock.now();
        self.run_due(now);

        match self.timer.phase() {
            TimerPhase::Paused => match self.timer.resume(now, &mut self.scheduler) {
                Ok(()) => Transition::Applied,
                Err(err) => ignored(err),
            },
            _ => self.ensure_countdown(now),
        }
    }

    /// Player looked away from the board, the countdown holds.
    pub fn pointer_leave(&mut self) -> Transition {
        let now = self.clock.now();
        self.run_due(now);

        match self.timer.pause(now, &mut self.scheduler) {
            Ok(()) => {
                self.presenter.timer_ticked(self.timer.remaining_secs());
                Transition::Applied
            }
            Err(err) => ignored(err),
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let tiles = self
            .engine
            .grid()
            .iter()
            .map(|tile| TileView {
                id: tile.id(),
                state: tile.state(),
                face: tile.face().filter(|_| !self.face_pending(tile.id())),
            })
            .collect();

        GameSnapshot {
            phase: self.phase,
            board: self.config.board,
            tiles,
            moves: self.engine.move_count(),
            matched_pairs: self.engine.matched_pairs(),
            total_pairs: self.engine.total_pairs(),
            remaining_secs: self.timer.remaining_secs(),
            timer: self.timer.phase(),
        }
    }

    pub fn summary(&self) -> GameSummary {
        let outcome = match self.phase {
            GamePhase::Won => Some(GameOutcome::Won),
            GamePhase::Lost => Some(GameOutcome::Lost),
            GamePhase::NotStarted | GamePhase::Playing => None,
        };

        GameSummary {
            outcome,
            moves: self.engine.move_count(),
            matched_tiles: self.engine.matched_tiles(),
            remaining_secs: self.timer.remaining_secs(),
        }
    }

    fn begin(&mut self, now: Instant) {
        self.set_phase(GamePhase::Playing);
        if let Err(err) = self
            .timer
            .start(self.config.time_limit, now, &mut self.scheduler)
        {
            log::warn!("Countdown did not start: {}", err);
        }
        self.presenter.timer_ticked(self.timer.remaining_secs());
    }

    /// Re-arms a countdown left stopped by a mid-game reset.
    fn ensure_countdown(&mut self, now: Instant) -> Transition {
        if self.phase != GamePhase::Playing || self.timer.phase() != TimerPhase::Stopped {
            return Transition::Ignored;
        }

        match self
            .timer
            .start(self.config.time_limit, now, &mut self.scheduler)
        {
            Ok(()) => {
                self.presenter.timer_ticked(self.timer.remaining_secs());
                Transition::Applied
            }
            Err(err) => ignored(err),
        }
    }

    fn rebuild(&mut self) -> Result<()> {
        let grid = self.generator.generate(self.config.board)?;

        for (handle, _) in self.pending_faces.drain(..) {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.pending_resolution.take() {
            self.scheduler.cancel(handle);
        }
        self.engine = MatchEngine::new(grid);
        self.timer.reset(self.config.time_limit, &mut self.scheduler);
        log::debug!(
            "Dealt a new {}x{} board",
            self.config.board.rows,
            self.config.board.cols
        );

        for tile in self.engine.grid().iter() {
            self.presenter.tile_state_changed(tile.id(), tile.state(), None);
        }
        self.presenter.move_count_changed(self.engine.move_count());
        self.presenter.timer_ticked(self.timer.remaining_secs());
        Ok(())
    }

    fn finish(&mut self, outcome: GameOutcome, now: Instant) {
        if let Err(err) = self.timer.stop(now, &mut self.scheduler) {
            log::trace!("Timer already halted: {}", err);
        }
        if outcome == GameOutcome::Lost {
            if let Some(handle) = self.pending_resolution.take() {
                self.scheduler.cancel(handle);
            }
        }
        self.set_phase(outcome.into());
        self.presenter.game_ended(outcome);
    }

    fn set_phase(&mut self, phase: GamePhase) {
        log::debug!("Game phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.presenter.game_phase_changed(phase);
    }

    fn run_due(&mut self, now: Instant) {
        while let Some((handle, task)) = self.scheduler.pop_due(now) {
            log::trace!("Running {:?} due at {:?}", task, handle.due());
            match task {
                Task::ShowFace { tile, upgrade } => self.show_face(handle, tile, upgrade),
                Task::ResolveMismatch => self.resolve_mismatch(handle),
                Task::Tick => self.tick(handle, now),
            }
        }
    }

    /// Follow-ups are scheduled from the instant the face became visible,
    /// not from a late wakeup.
    fn show_face(&mut self, handle: TaskHandle, tile: TileId, upgrade: Option<TileId>) {
        self.pending_faces.retain(|(pending, _)| *pending != handle);

        let Ok(&shown) = self.engine.tile(tile) else {
            log::warn!("Dropping face of unknown tile {}", tile);
            return;
        };
        if shown.state() == TileState::Hidden {
            log::warn!("Dropping face of tile {} that is face down", tile);
            return;
        }
        self.presenter
            .tile_state_changed(tile, shown.state(), shown.face());

        if let Some(partner) = upgrade {
            if let Ok(&other) = self.engine.tile(partner) {
                self.presenter
                    .tile_state_changed(other.id(), other.state(), other.face());
            }
        }

        let Some(pair) = self.engine.pending_mismatch() else {
            return;
        };
        if self.phase == GamePhase::Playing
            && self.pending_resolution.is_none()
            && pair.contains(&tile)
            && !pair.iter().any(|&id| self.face_pending(id))
        {
            match self.scheduler.schedule_after(
                handle.due(),
                self.config.mismatch_delay,
                Task::ResolveMismatch,
            ) {
                Ok(resolution) => self.pending_resolution = Some(resolution),
                Err(err) => log::warn!("Mismatch flip-back not scheduled: {}", err),
            }
        }
    }

    fn resolve_mismatch(&mut self, handle: TaskHandle) {
        if self.pending_resolution != Some(handle) {
            log::warn!("Dropping stale mismatch resolution");
            return;
        }
        self.pending_resolution = None;

        match self.engine.resolve_mismatch() {
            Ok(pair) => {
                for id in pair {
                    self.presenter.tile_state_changed(id, TileState::Hidden, None);
                }
                self.presenter.move_count_changed(self.engine.move_count());
            }
            Err(err) => log::warn!("Mismatch resolution failed: {}", err),
        }
    }

    fn tick(&mut self, handle: TaskHandle, now: Instant) {
        match self.timer.on_tick(handle, now, &mut self.scheduler) {
            TickOutcome::Idle => {}
            TickOutcome::Ticked(_) => {
                self.presenter.timer_ticked(self.timer.remaining_secs());
            }
            TickOutcome::Expired => {
                self.presenter.timer_ticked(0);
                if self.phase == GamePhase::Playing {
                    self.finish(GameOutcome::Lost, now);
                }
            }
        }
    }

    fn face_pending(&self, tile: TileId) -> bool {
        self.pending_faces.iter().any(|&(_, pending)| pending == tile)
    }

    fn check_phase(&self, allowed: &[GamePhase], action: &'static str) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                state: self.phase.describe(),
            })
        }
    }
}

fn ignored(err: GameError) -> Transition {
    log::debug!("Ignored: {}", err);
    Transition::Ignored
}
