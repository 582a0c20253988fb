/// Single coordinate axis used for board rows, columns and positions.
pub type Coord = u8;

/// Count type used for tile and pair counts.
pub type TileCount = u16;

/// Two-dimensional position `(row, col)`.
pub type Coord2 = (Coord, Coord);

/// Row-major index of a tile within its grid.
pub type TileId = TileCount;

/// Symbol hidden under a tile, `1..=pairs`.
pub type Symbol = u16;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> TileCount {
    let a = a as TileCount;
    let b = b as TileCount;
    a.saturating_mul(b)
}

/// Whether an operation changed anything.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Applied,
}

impl Transition {
    pub const fn has_update(self) -> bool {
        match self {
            Self::Ignored => false,
            Self::Applied => true,
        }
    }
}
