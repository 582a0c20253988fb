use rand::prelude::*;
use rand::rngs::SmallRng;

use super::*;

/// Uniformly shuffled board, reproducible when built from a seed.
#[derive(Clone, Debug)]
pub struct RandomBoardGenerator {
    rng: SmallRng,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(&mut self, config: BoardConfig) -> Result<Grid> {
        let config = config.validate()?;

        let mut values: Vec<Symbol> = (1..=config.total_pairs())
            .flat_map(|value| [value, value])
            .collect();
        shuffle(&mut self.rng, &mut values);
        log::debug!(
            "Generated {}x{} board with {} pairs",
            config.rows,
            config.cols,
            config.total_pairs()
        );

        Grid::from_values(config, &values)
    }
}

/// Fisher-Yates: walk from the last index down to 1, swapping each slot with
/// a uniformly chosen one in `[0, i]`.
fn shuffle<T, R: Rng>(rng: &mut R, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_counts(grid: &Grid) -> Vec<usize> {
        let mut counts = vec![0; usize::from(grid.total_pairs()) + 1];
        for value in grid.values() {
            counts[usize::from(value)] += 1;
        }
        counts
    }

    #[test]
    fn every_symbol_appears_exactly_twice() {
        let mut generator = RandomBoardGenerator::new(7);

        for (rows, cols) in [(1, 2), (2, 2), (3, 4), (4, 4), (5, 6), (8, 9)] {
            let grid = generator.generate(BoardConfig::new(rows, cols)).unwrap();
            let counts = value_counts(&grid);

            assert_eq!(grid.len(), usize::from(rows) * usize::from(cols));
            assert_eq!(counts[0], 0);
            assert!(counts[1..].iter().all(|&count| count == 2));
        }
    }

    #[test]
    fn odd_tile_count_is_rejected() {
        let mut generator = RandomBoardGenerator::new(7);

        assert_eq!(
            generator.generate(BoardConfig::new(3, 5)),
            Err(GameError::InvalidDimensions { rows: 3, cols: 5 })
        );
        assert_eq!(
            generator.generate(BoardConfig::new(0, 2)),
            Err(GameError::InvalidDimensions { rows: 0, cols: 2 })
        );
    }

    #[test]
    fn same_seed_gives_same_board() {
        let config = BoardConfig::new(4, 4);
        let first = RandomBoardGenerator::new(42).generate(config).unwrap();
        let second = RandomBoardGenerator::new(42).generate(config).unwrap();

        assert_eq!(first.values(), second.values());
    }

    #[test]
    fn shuffle_reaches_every_arrangement_of_a_small_multiset() {
        // [1, 1, 2, 2] has 6 distinct arrangements
        let mut rng = SmallRng::seed_from_u64(3);
        let mut seen = std::collections::BTreeMap::new();
        for _ in 0..6000 {
            let mut values = [1, 1, 2, 2];
            shuffle(&mut rng, &mut values);
            *seen.entry(values).or_insert(0u32) += 1;
        }

        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&hits| (800..1200).contains(&hits)));
    }

    #[test]
    fn preset_generator_validates_layout() {
        let mut preset = PresetBoardGenerator::new([1, 2, 2, 1]);

        assert!(preset.generate(BoardConfig::new(2, 2)).is_ok());
        assert_eq!(
            preset.generate(BoardConfig::new(1, 2)),
            Err(GameError::InvalidLayout)
        );
    }
}
