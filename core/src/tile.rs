use serde::{Deserialize, Serialize};

use crate::{Symbol, TileId};

/// Visibility of a tile. Only the match engine moves a tile between states.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    Hidden,
    Revealed,
    Matched,
}

impl TileState {
    /// Whether the face of the tile is visible to the player.
    pub const fn is_face_up(self) -> bool {
        matches!(self, Self::Revealed | Self::Matched)
    }
}

impl Default for TileState {
    fn default() -> Self {
        Self::Hidden
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    id: TileId,
    value: Symbol,
    state: TileState,
}

impl Tile {
    pub(crate) const fn new(id: TileId, value: Symbol) -> Self {
        Self {
            id,
            value,
            state: TileState::Hidden,
        }
    }

    pub const fn id(&self) -> TileId {
        self.id
    }

    pub const fn value(&self) -> Symbol {
        self.value
    }

    pub const fn state(&self) -> TileState {
        self.state
    }

    /// Value the presentation may show, `None` while the tile is face down.
    pub const fn face(&self) -> Option<Symbol> {
        if self.state.is_face_up() {
            Some(self.value)
        } else {
            None
        }
    }

    pub(crate) fn set_state(&mut self, state: TileState) {
        self.state = state;
    }
}
