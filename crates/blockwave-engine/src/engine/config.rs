use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Tuning options of the wave generator.
///
/// Every field has a default, so a configuration file only needs to name the
/// options it changes:
///
/// ```
/// use blockwave_engine::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_json::from_str(
///     r#"{ "duplicates_per_wave_cap": 1, "line_correction": { "scan_cols": false } }"#,
/// )
/// .unwrap();
/// assert_eq!(config.duplicates_per_wave_cap, 1);
/// assert_eq!(config.streak_length, 3);
/// assert!(config.line_correction.scan_rows);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Number of slots in a wave.
    pub slot_count: usize,
    /// Maximum repeats of one shape within a wave (1 to 3).
    pub duplicates_per_wave_cap: usize,
    /// Forbidden run length of identical wave signatures (2 to 5).
    pub streak_length: usize,
    pub small_piece_gate: SmallPieceGateConfig,
    pub difficulty: DifficultyConfig,
    pub selection: SelectionConfig,
    pub line_correction: LineCorrectionConfig,
    /// Whether later slots are chosen against a board holding earlier slots' placements.
    pub reserve_cells_during_wave_build: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            slot_count: 3,
            duplicates_per_wave_cap: 2,
            streak_length: 3,
            small_piece_gate: SmallPieceGateConfig::default(),
            difficulty: DifficultyConfig::default(),
            selection: SelectionConfig::default(),
            line_correction: LineCorrectionConfig::default(),
            reserve_cells_during_wave_build: false,
        }
    }
}

impl GeneratorConfig {
    /// Checks that every option is within its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_count == 0 {
            return Err(ConfigError::SlotCount);
        }
        if !(1..=3).contains(&self.duplicates_per_wave_cap) {
            return Err(ConfigError::DuplicateCap(self.duplicates_per_wave_cap));
        }
        if !(2..=5).contains(&self.streak_length) {
            return Err(ConfigError::StreakLength(self.streak_length));
        }
        self.difficulty.validate()?;
        self.small_piece_gate.validate()?;
        self.selection.validate()?;
        self.line_correction.validate()
    }
}

/// Acceptance chance of a small shape at both ends of the difficulty range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessPercent {
    pub at_a_min: f64,
    pub at_a_max: f64,
}

impl SuccessPercent {
    #[must_use]
    pub const fn new(at_a_min: f64, at_a_max: f64) -> Self {
        Self { at_a_min, at_a_max }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmallPieceGateConfig {
    pub enabled: bool,
    /// Tile count at or below which the gate applies.
    pub tile_threshold: usize,
    /// Tile count to acceptance percentages.
    pub success_table: BTreeMap<usize, SuccessPercent>,
}

impl Default for SmallPieceGateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tile_threshold: 3,
            success_table: BTreeMap::from([
                (1, SuccessPercent::new(100.0, 35.0)),
                (2, SuccessPercent::new(100.0, 55.0)),
                (3, SuccessPercent::new(100.0, 75.0)),
            ]),
        }
    }
}

impl SmallPieceGateConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |p: f64| (0.0..=100.0).contains(&p);
        for (&tiles, percent) in &self.success_table {
            if !in_range(percent.at_a_min) || !in_range(percent.at_a_max) {
                return Err(ConfigError::SuccessPercent { tiles });
            }
        }
        Ok(())
    }
}

/// Derivation of the difficulty exponent `a` from the run score.
///
/// `a = clamp(base + step * floor(score / score_interval), a_min, a_max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DifficultyConfig {
    pub a_min: f64,
    pub a_max: f64,
    pub base: f64,
    pub step: f64,
    pub score_interval: u64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            a_min: 0.3,
            a_max: 1.5,
            base: 0.3,
            step: 0.1,
            score_interval: 2000,
        }
    }
}

impl DifficultyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let Self { a_min, a_max, .. } = *self;
        if !a_min.is_finite() || !a_max.is_finite() || a_min > a_max {
            return Err(ConfigError::DifficultyBounds { a_min, a_max });
        }
        if self.score_interval == 0 {
            return Err(ConfigError::ScoreInterval);
        }
        Ok(())
    }

    /// Difficulty exponent for the given run score.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn exponent(&self, score: u64) -> f64 {
        let tier = (score / self.score_interval) as f64;
        (self.base + self.step * tier).clamp(self.a_min, self.a_max)
    }

    /// Position of `a` within `[a_min, a_max]`, in `[0, 1]`.
    #[must_use]
    pub fn normalized(&self, a: f64) -> f64 {
        let span = self.a_max - self.a_min;
        if span <= 0.0 {
            return 0.0;
        }
        ((a - self.a_min) / span).clamp(0.0, 1.0)
    }
}

/// How the placeable-weighted pick chooses among candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Weight each candidate by `tiles^a`.
    #[default]
    TilePower,
    /// Pick a tile-count group first, then a shape within it.
    Grouped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    pub policy: SelectionPolicy,
    /// Group-size exponent on a full board.
    pub group_beta_min: f64,
    /// Group-size exponent on an empty board.
    pub group_beta_max: f64,
    /// Exponent applied to `difficulty_score` within a group.
    pub difficulty_exponent: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::TilePower,
            group_beta_min: 0.0,
            group_beta_max: 1.0,
            difficulty_exponent: 1.0,
        }
    }
}

impl SelectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            group_beta_min: min,
            group_beta_max: max,
            ..
        } = *self;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::GroupBeta { min, max });
        }
        Ok(())
    }

    /// Group-size exponent for the given share of empty cells.
    #[must_use]
    pub fn group_beta(&self, vacancy_ratio: f64) -> f64 {
        self.group_beta_min + (self.group_beta_max - self.group_beta_min) * vacancy_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineCorrectionConfig {
    /// Longest gap considered; `None` means the full line length.
    pub max_run_length: Option<usize>,
    pub scan_rows: bool,
    pub scan_cols: bool,
    /// Maximum number of `(run, shape)` candidates collected per search.
    pub pair_budget: usize,
}

impl Default for LineCorrectionConfig {
    fn default() -> Self {
        Self {
            max_run_length: None,
            scan_rows: true,
            scan_cols: true,
            pair_budget: 200,
        }
    }
}

impl LineCorrectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_run_length == Some(0) {
            return Err(ConfigError::MaxRunLength);
        }
        if self.pair_budget == 0 {
            return Err(ConfigError::PairBudget);
        }
        Ok(())
    }
}
