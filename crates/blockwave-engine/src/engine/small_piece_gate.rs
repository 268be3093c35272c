use rand::Rng;

use crate::core::ShapeDefinition;

use super::config::{DifficultyConfig, SmallPieceGateConfig};

/// Probabilistic accept/reject step for shapes with few tiles.
///
/// Shapes above the tile threshold always pass. For smaller shapes the
/// acceptance chance is interpolated between the table's percentages at
/// `a_min` and `a_max`, by where the current difficulty exponent `a` sits in
/// that range. With the default table this makes one- to three-tile shapes
/// rarer as the score grows.
#[derive(Debug, Clone, Copy)]
pub struct SmallPieceGate<'a> {
    config: &'a SmallPieceGateConfig,
    difficulty: &'a DifficultyConfig,
}

impl<'a> SmallPieceGate<'a> {
    #[must_use]
    pub fn new(config: &'a SmallPieceGateConfig, difficulty: &'a DifficultyConfig) -> Self {
        Self { config, difficulty }
    }

    /// Acceptance probability of `shape` at exponent `a`, in `[0, 1]`.
    ///
    /// Returns `1.0` when the gate does not apply to the shape.
    #[must_use]
    pub fn success_probability(&self, shape: &ShapeDefinition, a: f64) -> f64 {
        let tiles = shape.active_cell_count();
        if !self.config.enabled || tiles > self.config.tile_threshold {
            return 1.0;
        }
        let Some(percent) = self.config.success_table.get(&tiles) else {
            return 1.0;
        };
        let t = self.difficulty.normalized(a);
        let percent = percent.at_a_min + (percent.at_a_max - percent.at_a_min) * t;
        (percent / 100.0).clamp(0.0, 1.0)
    }

    /// Rolls the gate for `shape` at exponent `a`.
    ///
    /// Draws from `rng` only when the gate applies to the shape.
    pub fn pass<R>(&self, shape: &ShapeDefinition, a: f64, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        let probability = self.success_probability(shape, a);
        if probability >= 1.0 {
            return true;
        }
        rng.random::<f64>() < probability
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::engine::config::SuccessPercent;

    fn shape(id: &str, tiles: usize) -> ShapeDefinition {
        let mut cells = [[false; 5]; 5];
        cells[0][..tiles].fill(true);
        ShapeDefinition::new(id, cells, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_large_shapes_always_pass() {
        let config = SmallPieceGateConfig::default();
        let difficulty = DifficultyConfig::default();
        let gate = SmallPieceGate::new(&config, &difficulty);
        let big = shape("I4", 4);
        assert!((gate.success_probability(&big, difficulty.a_max) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_probability_interpolates_with_difficulty() {
        let config = SmallPieceGateConfig::default();
        let difficulty = DifficultyConfig::default();
        let gate = SmallPieceGate::new(&config, &difficulty);
        let mono = shape("mono", 1);

        let at_min = gate.success_probability(&mono, difficulty.a_min);
        let mid = gate.success_probability(&mono, (difficulty.a_min + difficulty.a_max) / 2.0);
        let at_max = gate.success_probability(&mono, difficulty.a_max);
        assert!((at_min - 1.0).abs() < 1e-9);
        assert!((mid - 0.675).abs() < 1e-9);
        assert!((at_max - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_gate_and_missing_entries_pass() {
        let mut config = SmallPieceGateConfig::default();
        let difficulty = DifficultyConfig::default();
        config.success_table.remove(&2);
        let domino = shape("I2", 2);
        let gate = SmallPieceGate::new(&config, &difficulty);
        assert!((gate.success_probability(&domino, difficulty.a_max) - 1.0).abs() < f64::EPSILON);

        config.enabled = false;
        let gate = SmallPieceGate::new(&config, &difficulty);
        let mono = shape("mono", 1);
        assert!((gate.success_probability(&mono, difficulty.a_max) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pass_rate_matches_probability() {
        let mut config = SmallPieceGateConfig::default();
        config
            .success_table
            .insert(1, SuccessPercent::new(20.0, 20.0));
        let difficulty = DifficultyConfig::default();
        let gate = SmallPieceGate::new(&config, &difficulty);
        let mono = shape("mono", 1);

        let mut rng = Pcg32::seed_from_u64(17);
        let passed = (0..10_000)
            .filter(|_| gate.pass(&mono, difficulty.a_min, &mut rng))
            .count();
        assert!((1700..2300).contains(&passed), "{passed}");

        config.success_table.insert(1, SuccessPercent::new(0.0, 0.0));
        let gate = SmallPieceGate::new(&config, &difficulty);
        assert!(!(0..100).any(|_| gate.pass(&mono, difficulty.a_min, &mut rng)));
    }
}
