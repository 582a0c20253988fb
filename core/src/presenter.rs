use serde::{Deserialize, Serialize};

use crate::*;

/// Notifications the game sends to whatever draws it.
///
/// The presentation renders from these and never holds game state of its
/// own. Every method defaults to doing nothing.
pub trait Presenter {
    /// `face` is `None` while the tile is face down or still flipping.
    fn tile_state_changed(&mut self, _tile: TileId, _state: TileState, _face: Option<Symbol>) {}

    fn timer_ticked(&mut self, _remaining_secs: u64) {}

    fn move_count_changed(&mut self, _moves: u32) {}

    fn game_phase_changed(&mut self, _phase: GamePhase) {}

    fn game_ended(&mut self, _outcome: GameOutcome) {}
}

impl Presenter for () {}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn tile_state_changed(&mut self, tile: TileId, state: TileState, face: Option<Symbol>) {
        (**self).tile_state_changed(tile, state, face)
    }

    fn timer_ticked(&mut self, remaining_secs: u64) {
        (**self).timer_ticked(remaining_secs)
    }

    fn move_count_changed(&mut self, moves: u32) {
        (**self).move_count_changed(moves)
    }

    fn game_phase_changed(&mut self, phase: GamePhase) {
        (**self).game_phase_changed(phase)
    }

    fn game_ended(&mut self, outcome: GameOutcome) {
        (**self).game_ended(outcome)
    }
}

/// Recorded form of a [`Presenter`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    TileStateChanged {
        tile: TileId,
        state: TileState,
        face: Option<Symbol>,
    },
    TimerTicked(u64),
    MoveCountChanged(u32),
    GamePhaseChanged(GamePhase),
    GameEnded(GameOutcome),
}

/// Keeps every notification in order, handy for hosts that batch redraws.
impl Presenter for Vec<Notification> {
    fn tile_state_changed(&mut self, tile: TileId, state: TileState, face: Option<Symbol>) {
        self.push(Notification::TileStateChanged { tile, state, face });
    }

    fn timer_ticked(&mut self, remaining_secs: u64) {
        self.push(Notification::TimerTicked(remaining_secs));
    }

    fn move_count_changed(&mut self, moves: u32) {
        self.push(Notification::MoveCountChanged(moves));
    }

    fn game_phase_changed(&mut self, phase: GamePhase) {
        self.push(Notification::GamePhaseChanged(phase));
    }

    fn game_ended(&mut self, outcome: GameOutcome) {
        self.push(Notification::GameEnded(outcome));
    }
}

/// Inbound events from the presentation layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    TileClicked(TileId),
    PointerEnterBoard,
    PointerLeaveBoard,
    StartRequested,
    ResetRequested,
    RestartRequested,
}
