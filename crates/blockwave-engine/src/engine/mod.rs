//! Wave generation logic.
//!
//! - [`WaveGenerator`] - The service: owns the catalog, configuration, RNG and
//!   wave history; produces regular and revive waves
//! - [`GeneratorConfig`] - Tuning options, deserializable from JSON
//! - [`Wave`] / [`WaveSlot`] / [`SlotOrigin`] - Generated output
//! - [`WaveHistory`] / [`WaveSignature`] - Streak bookkeeping
//! - [`try_find_fit`] / [`can_place_anywhere`] - Placement search
//! - [`WeightTable`] / [`ShapeWeighting`] / [`GroupWeighting`] - Weighted selection
//! - [`SmallPieceGate`] - Difficulty-scaled rejection of small shapes
//! - [`LineCorrector`] - Search for shapes that exactly close a line
//! - [`WaveSeed`] - Seed for deterministic generation
//!
//! # Wave Flow
//!
//! 1. Snapshot the caller's board into a private [`BoardOccupancy`](crate::BoardOccupancy)
//! 2. Derive the difficulty exponent from the score
//! 3. Fill each slot: weighted pick, small-piece gate, optional line
//!    correction, duplicate cap
//! 4. Break a streak of identical waves, if one would form
//! 5. Guarantee the wave is playable, correcting a line if needed
//! 6. Record the wave's signature

pub use self::{
    config::*, fit_finder::*, generator::*, line_correction::*, seed::*, small_piece_gate::*,
    wave::*, wave_history::*, weighted_selector::*,
};

mod config;
mod fit_finder;
mod generator;
mod line_correction;
mod revive_composer;
mod seed;
mod small_piece_gate;
mod wave;
mod wave_composer;
mod wave_history;
mod weighted_selector;
