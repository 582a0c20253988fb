use serde::Serialize;
use smallvec::SmallVec;

use crate::*;

/// Tiles revealed but not yet resolved, never more than two.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RevealBuffer(SmallVec<[TileId; 2]>);

impl RevealBuffer {
    pub fn as_slice(&self) -> &[TileId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= 2
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.0.contains(&id)
    }

    fn push(&mut self, id: TileId) {
        self.0.push(id);
    }

    fn pair(&self) -> Option<[TileId; 2]> {
        match self.0.as_slice() {
            &[first, second] => Some([first, second]),
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

/// Two-card reveal/compare/resolve protocol over one grid.
/// Serialize only: counters and the reveal buffer are not re-checked against
/// the grid on the way back in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchEngine {
    grid: Grid,
    revealed: RevealBuffer,
    matched_pairs: TileCount,
    moves: u32,
}

impl MatchEngine {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            revealed: RevealBuffer::default(),
            matched_pairs: 0,
            moves: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tile(&self, id: TileId) -> Result<&Tile> {
        self.grid.tile(id)
    }

    pub fn revealed(&self) -> &RevealBuffer {
        &self.revealed
    }

    /// Failed attempts so far; a match costs no move.
    pub fn move_count(&self) -> u32 {
        self.moves
    }

    pub fn matched_pairs(&self) -> TileCount {
        self.matched_pairs
    }

    pub fn matched_tiles(&self) -> TileCount {
        self.matched_pairs * 2
    }

    pub fn total_pairs(&self) -> TileCount {
        self.grid.total_pairs()
    }

    pub fn is_won(&self) -> bool {
        self.matched_pairs == self.total_pairs()
    }

    /// The revealed pair waiting for [`Self::resolve_mismatch`], if any.
    pub fn pending_mismatch(&self) -> Option<[TileId; 2]> {
        self.revealed.pair()
    }

    pub fn reveal(&mut self, id: TileId) -> Result<RevealOutcome> {
        use RevealOutcome::*;

        let tile = self.grid.tile(id)?;
        if tile.state() != TileState::Hidden || self.revealed.is_full() {
            log::trace!(
                "Ignored reveal of tile {} ({:?}), {} awaiting resolution",
                id,
                tile.state(),
                self.revealed.len()
            );
            return Ok(Ignored);
        }

        self.grid.tile_mut(id)?.set_state(TileState::Revealed);
        self.revealed.push(id);
        log::debug!("Revealed tile {}", id);

        let Some(pair @ [first, second]) = self.revealed.pair() else {
            return Ok(AwaitingSecond);
        };

        if self.grid[first].value() != self.grid[second].value() {
            log::debug!("Tiles {} and {} do not match", first, second);
            return Ok(Mismatch(pair));
        }

        for id in pair {
            self.grid.tile_mut(id)?.set_state(TileState::Matched);
        }
        self.revealed.clear();
        self.matched_pairs += 1;
        log::debug!(
            "Matched tiles {} and {}, {}/{} pairs",
            first,
            second,
            self.matched_pairs,
            self.total_pairs()
        );

        Ok(if self.is_won() { Won(pair) } else { Matched(pair) })
    }

    /// Flips a mismatched pair back face down and counts the failed move.
    pub fn resolve_mismatch(&mut self) -> Result<[TileId; 2]> {
        let pair = self
            .revealed
            .pair()
            .ok_or(GameError::InvalidTransition {
                action: "resolve a mismatch",
                state: "no mismatch is pending",
            })?;

        for id in pair {
            self.grid.tile_mut(id)?.set_state(TileState::Hidden);
        }
        self.revealed.clear();
        self.moves += 1;
        log::debug!("Flipped back tiles {:?}, moves: {}", pair, self.moves);

        Ok(pair)
    }
}
