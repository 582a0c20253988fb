//! Game state machine for a timed tile-matching memory game.
//!
//! A [`Grid`] of face-down tiles hides pairs of symbols. The [`MatchEngine`]
//! runs the reveal/compare/resolve cycle, the [`SessionTimer`] counts down
//! and the [`GameController`] wires both to an external [`Presenter`].
//! Deferred work (showing a face, flipping a mismatch back, timer ticks) is
//! queued on a [`Scheduler`] and driven by the host through
//! [`GameController::advance`].

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use clock::*;
pub use config::*;
pub use controller::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use presenter::*;
pub use schedule::*;
pub use tile::*;
pub use timer::*;
pub use types::*;

mod clock;
mod config;
mod controller;
mod engine;
mod error;
mod generator;
mod presenter;
mod schedule;
mod tile;
mod timer;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub rows: Coord,
    pub cols: Coord,
}

impl BoardConfig {
    pub const fn new(rows: Coord, cols: Coord) -> Self {
        Self { rows, cols }
    }

    /// Rejects boards that cannot be split into pairs.
    pub fn validate(self) -> Result<Self> {
        let total = self.total_tiles();
        if total == 0 || total % 2 != 0 {
            return Err(GameError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self)
    }

    pub const fn total_tiles(&self) -> TileCount {
        mult(self.rows, self.cols)
    }

    pub const fn total_pairs(&self) -> TileCount {
        self.total_tiles() / 2
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

/// Tiles of one board in row-major order.
///
/// Deserializing goes through the same pairing checks as
/// [`Grid::from_values`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr")]
pub struct Grid {
    config: BoardConfig,
    tiles: Array2<Tile>,
}

#[derive(Deserialize)]
struct GridRepr {
    config: BoardConfig,
    tiles: Array2<Tile>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = GameError;

    fn try_from(repr: GridRepr) -> Result<Self> {
        let shape = (usize::from(repr.config.rows), usize::from(repr.config.cols));
        if repr.tiles.dim() != shape {
            return Err(GameError::InvalidDimensions {
                rows: repr.config.rows,
                cols: repr.config.cols,
            });
        }

        let values: Vec<Symbol> = repr.tiles.iter().map(Tile::value).collect();
        let mut grid = Self::from_values(repr.config, &values)?;
        for (tile, saved) in grid.tiles.iter_mut().zip(repr.tiles.iter()) {
            if tile.id() != saved.id() {
                return Err(GameError::InvalidLayout);
            }
            tile.set_state(saved.state());
        }
        Ok(grid)
    }
}

impl Grid {
    /// Builds a grid from `values` in row-major order, checking that every
    /// symbol of `1..=pairs` appears exactly twice.
    pub fn from_values(config: BoardConfig, values: &[Symbol]) -> Result<Self> {
        let config = config.validate()?;
        if values.len() != usize::from(config.total_tiles()) {
            return Err(GameError::InvalidLayout);
        }

        let pairs = usize::from(config.total_pairs());
        let mut seen = vec![0u8; pairs + 1];
        for &value in values {
            let slot = seen
                .get_mut(usize::from(value))
                .filter(|_| value != 0)
                .ok_or(GameError::InvalidLayout)?;
            *slot += 1;
            if *slot > 2 {
                return Err(GameError::InvalidLayout);
            }
        }
        if seen.iter().skip(1).any(|&count| count != 2) {
            return Err(GameError::InvalidLayout);
        }

        let tiles: Vec<Tile> = (0..)
            .zip(values)
            .map(|(id, &value)| Tile::new(id, value))
            .collect();
        let shape = (usize::from(config.rows), usize::from(config.cols));
        let tiles = Array2::from_shape_vec(shape, tiles).map_err(|_| {
            GameError::InvalidDimensions {
                rows: config.rows,
                cols: config.cols,
            }
        })?;

        Ok(Self { config, tiles })
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn total_pairs(&self) -> TileCount {
        self.config.total_pairs()
    }

    pub fn position(&self, id: TileId) -> Result<Coord2> {
        if id >= self.config.total_tiles() {
            return Err(GameError::InvalidTile(id));
        }
        let cols = TileCount::from(self.config.cols);
        // both parts are bounded by rows and cols, which fit in a Coord
        Ok(((id / cols) as Coord, (id % cols) as Coord))
    }

    pub fn tile(&self, id: TileId) -> Result<&Tile> {
        let coords = self.position(id)?;
        Ok(&self.tiles[coords.to_nd_index()])
    }

    pub fn tile_at(&self, coords: Coord2) -> Option<&Tile> {
        self.tiles.get(coords.to_nd_index())
    }

    /// Tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn values(&self) -> Vec<Symbol> {
        self.tiles.iter().map(Tile::value).collect()
    }

    pub(crate) fn tile_mut(&mut self, id: TileId) -> Result<&mut Tile> {
        let coords = self.position(id)?;
        Ok(&mut self.tiles[coords.to_nd_index()])
    }
}

impl Index<TileId> for Grid {
    type Output = Tile;

    fn index(&self, id: TileId) -> &Self::Output {
        let cols = TileCount::from(self.config.cols);
        &self.tiles[(usize::from(id / cols), usize::from(id % cols))]
    }
}

/// Result of asking the engine to reveal a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealOutcome {
    /// Tile already face up, or two tiles are already awaiting resolution.
    Ignored,
    AwaitingSecond,
    Matched([TileId; 2]),
    /// The pair stays revealed until [`MatchEngine::resolve_mismatch`].
    Mismatch([TileId; 2]),
    /// Last pair matched.
    Won([TileId; 2]),
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            Ignored => false,
            AwaitingSecond => true,
            Matched(_) => true,
            Mismatch(_) => true,
            Won(_) => true,
        }
    }

    pub const fn is_won(self) -> bool {
        matches!(self, Self::Won(_))
    }

    /// Both tiles of a completed comparison.
    pub const fn pair(self) -> Option<[TileId; 2]> {
        match self {
            Self::Matched(pair) | Self::Mismatch(pair) | Self::Won(pair) => Some(pair),
            Self::Ignored | Self::AwaitingSecond => None,
        }
    }
}
