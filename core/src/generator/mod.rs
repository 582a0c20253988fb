use crate::*;
pub use random::*;

mod random;

pub trait BoardGenerator {
    fn generate(&mut self, config: BoardConfig) -> Result<Grid>;
}

/// Replays one fixed layout on every call, for replays and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct PresetBoardGenerator {
    values: Vec<Symbol>,
}

impl PresetBoardGenerator {
    pub fn new(values: impl Into<Vec<Symbol>>) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl BoardGenerator for PresetBoardGenerator {
    fn generate(&mut self, config: BoardConfig) -> Result<Grid> {
        Grid::from_values(config, &self.values)
    }
}

impl<G: BoardGenerator + ?Sized> BoardGenerator for &mut G {
    fn generate(&mut self, config: BoardConfig) -> Result<Grid> {
        (**self).generate(config)
    }
}
