use core::time::Duration;
use thiserror::Error;

use crate::{Coord, TileId};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid board dimensions {rows}x{cols}, tile count must be even and positive")]
    InvalidDimensions { rows: Coord, cols: Coord },
    #[error("Board values must hold exactly two copies of each symbol")]
    InvalidLayout,
    #[error("Invalid tile id {0}")]
    InvalidTile(TileId),
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("Delay of {0:?} runs past the end of the clock")]
    DelayOverflow(Duration),
}

pub type Result<T> = core::result::Result<T, GameError>;
