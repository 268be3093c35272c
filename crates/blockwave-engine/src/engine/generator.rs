use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{
    BoardError, ConfigError,
    core::{BoardOccupancy, BoardQuery, ShapeCatalog},
};

use super::{
    config::GeneratorConfig, revive_composer::ReviveComposer, seed::WaveSeed, wave::Wave,
    wave_composer::WaveComposer, wave_history::WaveHistory, weighted_selector::WeightTableCache,
};

/// Read-only access to the current run score.
pub trait ScoreQuery {
    fn score(&self) -> u64;
}

impl ScoreQuery for u64 {
    fn score(&self) -> u64 {
        *self
    }
}

impl<T> ScoreQuery for &T
where
    T: ScoreQuery + ?Sized,
{
    fn score(&self) -> u64 {
        (**self).score()
    }
}

/// Wave generation service.
///
/// Owns the shape catalog, the configuration, the random number generator,
/// and the wave history that forbids streaks of identical waves. Each call
/// snapshots the caller's board into a private [`BoardOccupancy`]; the live
/// board is never written.
///
/// # Example
///
/// ```
/// use blockwave_engine::{BoardOccupancy, GeneratorConfig, ShapeCatalog, WaveGenerator};
///
/// let mut generator =
///     WaveGenerator::new(ShapeCatalog::standard(), GeneratorConfig::default()).unwrap();
/// let board = BoardOccupancy::new(8, 8).unwrap();
///
/// let wave = generator.generate_wave(&board, 0u64).unwrap();
/// assert_eq!(wave.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct WaveGenerator {
    catalog: ShapeCatalog,
    catalog_version: u64,
    config: GeneratorConfig,
    rng: Pcg32,
    history: WaveHistory,
    weight_cache: WeightTableCache,
}

impl WaveGenerator {
    /// Creates a generator with a random seed.
    ///
    /// For reproducible waves, use [`Self::with_seed`] instead.
    pub fn new(catalog: ShapeCatalog, config: GeneratorConfig) -> Result<Self, ConfigError> {
        Self::with_seed(catalog, config, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic generation.
    pub fn with_seed(
        catalog: ShapeCatalog,
        config: GeneratorConfig,
        seed: WaveSeed,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            catalog,
            catalog_version: 0,
            config,
            rng: Pcg32::from_seed(seed.to_bytes()),
            history: WaveHistory::new(),
            weight_cache: WeightTableCache::new(),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &ShapeCatalog {
        &self.catalog
    }

    /// Incremented by every [`Self::reload_catalog`].
    #[must_use]
    pub fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &WaveHistory {
        &self.history
    }

    /// Generates a wave of `slot_count` slots (from the configuration).
    ///
    /// Fails only if the board cannot be snapshotted (zero-sized or wider
    /// than [`MAX_BOARD_WIDTH`](crate::MAX_BOARD_WIDTH) columns).
    pub fn generate_wave<B, S>(&mut self, board: &B, score: S) -> Result<Wave, BoardError>
    where
        B: BoardQuery,
        S: ScoreQuery,
    {
        self.generate_wave_with_slots(board, score, self.config.slot_count)
    }

    /// Like [`Self::generate_wave`], with an explicit slot count.
    ///
    /// A slot count of zero yields an empty wave and leaves the history untouched.
    pub fn generate_wave_with_slots<B, S>(
        &mut self,
        board: &B,
        score: S,
        slot_count: usize,
    ) -> Result<Wave, BoardError>
    where
        B: BoardQuery,
        S: ScoreQuery,
    {
        let snapshot = BoardOccupancy::from_query(board)?;
        if slot_count == 0 {
            return Ok(Wave::default());
        }
        let wave = WaveComposer {
            catalog: &self.catalog,
            catalog_version: self.catalog_version,
            config: &self.config,
            weight_cache: &mut self.weight_cache,
            history: &mut self.history,
            rng: &mut self.rng,
        }
        .compose(&snapshot, score.score(), slot_count);
        tracing::debug!(wave = %wave, "wave generated");
        Ok(wave)
    }

    /// Generates a revive wave whose first slot closes a line on `board`.
    ///
    /// Returns `Ok(None)` when no line can be closed; the caller should end
    /// the run.
    pub fn generate_revive_wave<B, S>(
        &mut self,
        board: &B,
        score: S,
    ) -> Result<Option<Wave>, BoardError>
    where
        B: BoardQuery,
        S: ScoreQuery,
    {
        let snapshot = BoardOccupancy::from_query(board)?;
        let wave = ReviveComposer {
            catalog: &self.catalog,
            catalog_version: self.catalog_version,
            config: &self.config,
            weight_cache: &mut self.weight_cache,
            history: &mut self.history,
            rng: &mut self.rng,
        }
        .compose(&snapshot, score.score(), self.config.slot_count);
        Ok(wave)
    }

    /// Forgets every previously generated wave signature.
    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    /// Replaces the shape catalog and invalidates cached weight tables.
    pub fn reload_catalog(&mut self, catalog: ShapeCatalog) {
        self.catalog = catalog;
        self.catalog_version += 1;
        self.weight_cache.retain_version(self.catalog_version);
        tracing::info!(
            version = self.catalog_version,
            shapes = self.catalog.len(),
            "shape catalog reloaded"
        );
    }
}
