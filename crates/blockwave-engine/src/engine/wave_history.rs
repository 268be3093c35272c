use std::collections::VecDeque;

use super::wave::{Wave, WaveSignature};

/// Recent wave signatures, used to forbid streaks of identical waves.
///
/// With a streak length of `n`, only the last `n - 1` signatures are kept:
/// a new wave completes a streak iff all of them equal its signature.
#[derive(Debug, Clone, Default)]
pub struct WaveHistory {
    recent: VecDeque<WaveSignature>,
}

impl WaveHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn make_signature(wave: &Wave) -> WaveSignature {
        wave.signature()
    }

    /// Whether registering `signature` would make `streak_length` identical
    /// signatures in a row.
    ///
    /// Always `false` for a streak length of 0 or 1.
    #[must_use]
    pub fn would_become_streak(&self, signature: &WaveSignature, streak_length: usize) -> bool {
        if streak_length <= 1 {
            return false;
        }
        let needed = streak_length - 1;
        self.recent.len() >= needed && self.recent.iter().rev().take(needed).all(|s| s == signature)
    }

    /// Records `signature`, keeping only the last `streak_length - 1` entries.
    pub fn register(&mut self, signature: WaveSignature, streak_length: usize) {
        self.recent.push_back(signature);
        let keep = streak_length.saturating_sub(1);
        while self.recent.len() > keep {
            self.recent.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WaveSignature> + '_ {
        self.recent.iter()
    }
}
