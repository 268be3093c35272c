use std::collections::HashSet;

use rand::Rng;

use crate::core::{BoardOccupancy, ShapeCatalog};

use super::{
    config::GeneratorConfig,
    fit_finder::try_find_fit,
    line_correction::LineCorrector,
    wave::{SlotOrigin, Wave, WaveSlot},
    wave_composer::{
        Pick, SlotLimits, break_streak, commit, replay_fits, select_ignoring_placement,
    },
    wave_history::WaveHistory,
    weighted_selector::{ShapeWeighting, WeightTableCache, select_weighted},
};

/// Builds revive waves: a guaranteed line correction first, then easy picks.
///
/// Slot 0 is always a correction found on the real board, with no gate and
/// no exclusions. It is simulated on a virtual board, and the remaining slots
/// are drawn with inverse tile-power weighting among shapes that fit that
/// evolving board, each carrying its fit. The small-piece gate does not apply.
///
/// A streak break never touches slot 0. It replaces a later slot, and every
/// fit from that slot onward is replayed on the real board.
#[derive(Debug)]
pub(super) struct ReviveComposer<'a, R: ?Sized> {
    pub(super) catalog: &'a ShapeCatalog,
    pub(super) catalog_version: u64,
    pub(super) config: &'a GeneratorConfig,
    pub(super) weight_cache: &'a mut WeightTableCache,
    pub(super) history: &'a mut WaveHistory,
    pub(super) rng: &'a mut R,
}

impl<R> ReviveComposer<'_, R>
where
    R: Rng + ?Sized,
{
    /// Returns `None` if the board has no correctable line.
    pub(super) fn compose(
        &mut self,
        board: &BoardOccupancy,
        score: u64,
        slot_count: usize,
    ) -> Option<Wave> {
        let corrector = LineCorrector::new(&self.config.line_correction);
        let Some(correction) = corrector.try_fix(board, self.catalog, &HashSet::new(), self.rng)
        else {
            tracing::info!("revive unavailable: no line can be corrected");
            return None;
        };
        tracing::info!(
            shape = %self.catalog.get(correction.shape).id(),
            axis = ?correction.run.axis,
            line = correction.run.index,
            "revive correction found"
        );

        let a = self.config.difficulty.exponent(score);
        let mut limits = SlotLimits::new(self.config.duplicates_per_wave_cap);
        let mut virtual_board = board.clone();
        let mut slots = Vec::with_capacity(slot_count);

        let mut first = Some(Pick::from_correction(correction));
        for slot in 0..slot_count {
            let pick = first.take().unwrap_or_else(|| self.pick_easy(&virtual_board, &limits, a));
            if !pick.origin.is_forced() {
                limits.record(pick.index);
            }
            commit(Some(&mut virtual_board), &pick);

            let shape = self.catalog.get(pick.index);
            tracing::debug!(slot, shape = %shape.id(), origin = %pick.origin, "revive slot filled");
            slots.push(WaveSlot::new(shape.clone(), pick.fit, pick.origin));
        }

        let mut wave = Wave::new(slots);
        let streak_length = self.config.streak_length;
        if self.history.would_become_streak(&wave.signature(), streak_length) {
            let replaced = break_streak(
                &mut wave,
                self.catalog,
                self.config.duplicates_per_wave_cap,
                1,
                self.rng,
            );
            if let Some(from) = replaced {
                replay_fits(&mut wave, board, from, self.rng);
            }
        }
        self.history
            .register(WaveHistory::make_signature(&wave), streak_length);
        Some(wave)
    }

    /// Inverse tile-power pick, preferring shapes that fit `board`.
    fn pick_easy(&mut self, board: &BoardOccupancy, limits: &SlotLimits, a: f64) -> Pick {
        let weighting = ShapeWeighting::InverseTilePower(a);
        let candidates = self
            .catalog
            .usable_indices()
            .iter()
            .copied()
            .filter(|&i| !limits.is_excluded(i))
            .collect::<Vec<_>>();

        let mut placeable = Vec::new();
        let mut fits = Vec::new();
        for &i in &candidates {
            if let Some(fit) = try_find_fit(board, self.catalog.get(i), self.rng) {
                placeable.push(i);
                fits.push(fit);
            }
        }
        if let Some(pos) = select_weighted(self.catalog, &placeable, weighting, self.rng) {
            return Pick {
                index: placeable[pos],
                fit: Some(fits.swap_remove(pos)),
                origin: SlotOrigin::Placeable,
            };
        }
        if let Some(pos) = select_weighted(self.catalog, &candidates, weighting, self.rng) {
            return Pick {
                index: candidates[pos],
                fit: None,
                origin: SlotOrigin::Unplaceable,
            };
        }

        let usable = self.catalog.usable_indices();
        let index = select_ignoring_placement(
            self.catalog,
            self.catalog_version,
            self.weight_cache,
            usable,
            weighting,
            self.rng,
        )
        .unwrap_or(usable[0]);
        tracing::warn!(
            shape = %self.catalog.get(index).id(),
            "revive slot attempts exhausted, forcing a shape past the duplicate cap"
        );
        Pick {
            index,
            fit: try_find_fit(board, self.catalog.get(index), self.rng),
            origin: SlotOrigin::Forced,
        }
    }
}
