//! Wave generation engine for grid block-placement puzzles.
//!
//! The engine decides which pieces to offer the player each time their hand
//! is empty, or when a revive is granted. It is split in two layers:
//!
//! - [`core`] - Data structures: shapes, the shape catalog, board occupancy
//!   snapshots and placement fits.
//! - [`engine`] - Generation logic: fit search, weighted selection, the
//!   small-piece gate, line correction, wave and revive composition, and the
//!   [`WaveGenerator`] service that ties them together.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Error raised when a shape definition cannot be built.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ShapeError {
    #[display("expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },
    #[display("row {row} must have exactly {expected} cells, got {actual}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("invalid cell character {ch:?} at row {row}")]
    InvalidCell { row: usize, ch: char },
    #[display("spawn weight must be finite and non-negative, got {_0}")]
    InvalidSpawnWeight(#[error(not(source))] f64),
    #[display("difficulty score must be finite and non-negative, got {_0}")]
    InvalidDifficulty(#[error(not(source))] f64),
}

/// Error raised when a shape catalog cannot be built.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("shape catalog is empty")]
    Empty,
    #[display("shape catalog has no shape with an active cell")]
    NoUsableShape,
    #[display("duplicate shape id {_0:?}")]
    DuplicateId(#[error(not(source))] String),
    #[display("invalid shape {id:?}: {source}")]
    InvalidShape { id: String, source: ShapeError },
}

/// Error raised when a board occupancy cannot be built or parsed.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum BoardError {
    #[display("board must have at least one row and one column, got {rows}x{cols}")]
    EmptyBoard { rows: usize, cols: usize },
    #[display("board is {cols} columns wide, at most {max} are supported")]
    TooWide { cols: usize, max: usize },
    #[display("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("invalid board cell character {ch:?} at row {row}")]
    InvalidCell { row: usize, ch: char },
}

/// Error raised when a generator configuration is out of range.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("slot_count must be at least 1")]
    SlotCount,
    #[display("duplicates_per_wave_cap must be within 1..=3, got {_0}")]
    DuplicateCap(#[error(not(source))] usize),
    #[display("streak_length must be within 2..=5, got {_0}")]
    StreakLength(#[error(not(source))] usize),
    #[display("difficulty bounds are invalid: a_min={a_min}, a_max={a_max}")]
    DifficultyBounds { a_min: f64, a_max: f64 },
    #[display("difficulty.score_interval must be at least 1")]
    ScoreInterval,
    #[display("success percent for {tiles} tiles must be within 0..=100")]
    SuccessPercent { tiles: usize },
    #[display("group beta bounds are invalid: min={min}, max={max}")]
    GroupBeta { min: f64, max: f64 },
    #[display("line_correction.max_run_length must be at least 1")]
    MaxRunLength,
    #[display("line_correction.pair_budget must be at least 1")]
    PairBudget,
}

/// Error raised when a wave seed cannot be parsed.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SeedError {
    #[display("invalid hex: expected 32 characters, got {_0}")]
    Length(#[error(not(source))] usize),
    #[display("invalid hex: {_0:?}")]
    Digits(#[error(not(source))] String),
}
