//! Composition of regular waves.
//!
//! Each slot is filled by up to one attempt per catalog shape:
//!
//! 1. A weighted pick among shapes that fit somewhere on the board (tile
//!    power or grouped, per the selection policy). If none fits, a
//!    spawn-weight pick that ignores placement instead.
//! 2. The small-piece gate. A rejected shape gets one chance at a line
//!    correction in its place; if that fails too, the shape is penalized for
//!    the rest of the wave and the slot is retried.
//! 3. An accepted shape bumps its duplicate counter. Shapes at the cap are
//!    excluded from later picks and corrections.
//!
//! A slot whose attempts run out is force-filled, ignoring both exclusion
//! sets. Once every slot is filled, a wave that would extend a streak of
//! identical waves has one slot replaced, and a wave with nothing placeable
//! on the real board gets a line correction in slot 0. In reservation mode,
//! fits from the first replaced slot onward are replayed on the real board.

use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::core::{BoardOccupancy, PlacementFit, ShapeCatalog};

use super::{
    config::{GeneratorConfig, SelectionPolicy},
    fit_finder::{can_place_anywhere, try_find_fit},
    line_correction::{Correction, LineCorrector},
    small_piece_gate::SmallPieceGate,
    wave::{SlotOrigin, Wave, WaveSlot},
    wave_history::WaveHistory,
    weighted_selector::{GroupWeighting, ShapeWeighting, WeightTableCache, select_weighted},
};

/// Shape chosen for a slot, by catalog index.
#[derive(Debug, Clone)]
pub(super) struct Pick {
    pub(super) index: usize,
    pub(super) fit: Option<PlacementFit>,
    pub(super) origin: SlotOrigin,
}

impl Pick {
    pub(super) fn from_correction(correction: Correction) -> Self {
        Self {
            index: correction.shape,
            fit: Some(correction.fit),
            origin: SlotOrigin::Correction,
        }
    }
}

/// Per-wave duplicate counters and exclusion sets.
#[derive(Debug)]
pub(super) struct SlotLimits {
    cap: usize,
    counts: HashMap<usize, usize>,
    capped: HashSet<usize>,
    penalized: HashSet<usize>,
}

impl SlotLimits {
    pub(super) fn new(cap: usize) -> Self {
        Self {
            cap,
            counts: HashMap::new(),
            capped: HashSet::new(),
            penalized: HashSet::new(),
        }
    }

    /// Shapes that reached the duplicate cap.
    pub(super) fn capped(&self) -> &HashSet<usize> {
        &self.capped
    }

    pub(super) fn is_excluded(&self, index: usize) -> bool {
        self.capped.contains(&index) || self.penalized.contains(&index)
    }

    pub(super) fn penalize(&mut self, index: usize) {
        self.penalized.insert(index);
    }

    /// Counts an accepted, non-forced shape.
    pub(super) fn record(&mut self, index: usize) {
        let count = self.counts.entry(index).or_default();
        *count += 1;
        if *count >= self.cap {
            self.capped.insert(index);
        }
    }
}

/// Places the pick's fit on the virtual board, if both exist, and clears completed lines.
pub(super) fn commit(virtual_board: Option<&mut BoardOccupancy>, pick: &Pick) {
    if let (Some(board), Some(fit)) = (virtual_board, &pick.fit) {
        board.place(fit);
        board.resolve_lines();
    }
}

/// Replaces one random slot at or after `first_slot` so the wave's signature
/// changes.
///
/// The replacement is the largest shape (by active cell count, earliest in
/// the catalog on ties) that differs from the replaced shape and is below the
/// duplicate cap within the wave. It carries no fit. Returns the replaced
/// slot, or `None` if no shape qualifies.
pub(super) fn break_streak<R>(
    wave: &mut Wave,
    catalog: &ShapeCatalog,
    cap: usize,
    first_slot: usize,
    rng: &mut R,
) -> Option<usize>
where
    R: Rng + ?Sized,
{
    if first_slot >= wave.len() {
        tracing::info!(slots = wave.len(), "no replaceable slot to break streak");
        return None;
    }
    let slot = rng.random_range(first_slot..wave.len());
    let previous = wave.slots()[slot].shape.id().clone();
    let replacement = catalog
        .usable_indices()
        .iter()
        .map(|&i| catalog.get(i))
        .filter(|shape| *shape.id() != previous && wave.count_of(shape.id()) < cap)
        .min_by_key(|shape| std::cmp::Reverse(shape.active_cell_count()));

    let Some(replacement) = replacement else {
        tracing::info!(slot, shape = %previous, "no replacement available to break streak");
        return None;
    };
    tracing::info!(
        slot,
        from = %previous,
        to = %replacement.id(),
        "breaking wave streak"
    );
    wave.slots_mut()[slot] = WaveSlot::new(replacement.clone(), None, SlotOrigin::StreakBreak);
    Some(slot)
}

/// Re-derives sequential fits after slot `from` was replaced.
///
/// The wave is replayed on a copy of `board`, placing each fit and resolving
/// lines. From `from` onward, every slot that carried a fit, and every streak
/// break replacement, keeps its fit only if it is still valid on the replayed
/// board and gets a fresh one from [`try_find_fit`] otherwise.
pub(super) fn replay_fits<R>(wave: &mut Wave, board: &BoardOccupancy, from: usize, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let mut replay = board.clone();
    for (i, slot) in wave.slots_mut().iter_mut().enumerate() {
        let rederive = i >= from && (slot.fit.is_some() || slot.origin.is_streak_break());
        if rederive && slot.fit.as_ref().is_none_or(|fit| !fit.is_valid_on(&replay)) {
            slot.fit = try_find_fit(&replay, &slot.shape, rng);
            tracing::debug!(
                slot = i,
                shape = %slot.shape.id(),
                placed = slot.fit.is_some(),
                "fit re-derived after slot replacement"
            );
        }
        if let Some(fit) = &slot.fit {
            replay.place(fit);
            replay.resolve_lines();
        }
    }
}

/// Spawn-weight pick among `candidates`, ignoring placement. Returns a catalog index.
///
/// Uses the cached catalog-wide table when `candidates` covers every usable
/// shape. If every candidate has zero spawn weight, `fallback` is used.
pub(super) fn select_ignoring_placement<R>(
    catalog: &ShapeCatalog,
    catalog_version: u64,
    weight_cache: &mut WeightTableCache,
    candidates: &[usize],
    fallback: ShapeWeighting,
    rng: &mut R,
) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let whole_catalog = candidates.len() == catalog.usable_indices().len();
    [ShapeWeighting::Static, fallback]
        .into_iter()
        .find_map(|weighting| {
            if whole_catalog {
                weight_cache.select_from_catalog(catalog, catalog_version, weighting, rng)
            } else {
                select_weighted(catalog, candidates, weighting, rng).map(|pos| candidates[pos])
            }
        })
}

/// Builds regular waves for one generator call.
#[derive(Debug)]
pub(super) struct WaveComposer<'a, R: ?Sized> {
    pub(super) catalog: &'a ShapeCatalog,
    pub(super) catalog_version: u64,
    pub(super) config: &'a GeneratorConfig,
    pub(super) weight_cache: &'a mut WeightTableCache,
    pub(super) history: &'a mut WaveHistory,
    pub(super) rng: &'a mut R,
}

impl<R> WaveComposer<'_, R>
where
    R: Rng + ?Sized,
{
    /// Composes a wave of `slot_count` slots for the board snapshot `board`.
    pub(super) fn compose(
        &mut self,
        board: &BoardOccupancy,
        score: u64,
        slot_count: usize,
    ) -> Wave {
        let a = self.config.difficulty.exponent(score);
        let mut limits = SlotLimits::new(self.config.duplicates_per_wave_cap);
        let mut virtual_board = self
            .config
            .reserve_cells_during_wave_build
            .then(|| board.clone());

        let mut slots = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            let current = virtual_board.as_ref().unwrap_or(board);
            let pick = self
                .pick_slot(current, &mut limits, a)
                .unwrap_or_else(|| self.pick_forced(current, a));
            if !pick.origin.is_forced() {
                limits.record(pick.index);
            }
            commit(virtual_board.as_mut(), &pick);

            let shape = self.catalog.get(pick.index);
            tracing::debug!(slot, shape = %shape.id(), origin = %pick.origin, "wave slot filled");
            slots.push(WaveSlot::new(shape.clone(), pick.fit, pick.origin));
        }

        let mut wave = Wave::new(slots);
        let mut replaced = None;
        if self.history.would_become_streak(&wave.signature(), self.config.streak_length) {
            replaced = break_streak(
                &mut wave,
                self.catalog,
                self.config.duplicates_per_wave_cap,
                0,
                self.rng,
            );
        }
        if self.ensure_playable(&mut wave, board) {
            replaced = Some(0);
        }
        if let Some(from) = replaced.filter(|_| virtual_board.is_some()) {
            replay_fits(&mut wave, board, from, self.rng);
        }
        self.history
            .register(WaveHistory::make_signature(&wave), self.config.streak_length);
        wave
    }

    /// Runs the attempts for one slot. Returns `None` when they are exhausted.
    fn pick_slot(
        &mut self,
        board: &BoardOccupancy,
        limits: &mut SlotLimits,
        a: f64,
    ) -> Option<Pick> {
        let config = self.config;
        let gate = SmallPieceGate::new(&config.small_piece_gate, &config.difficulty);
        let corrector = LineCorrector::new(&config.line_correction);

        for _ in 0..self.catalog.len() {
            let pick = self.pick_candidate(board, limits, a)?;
            if gate.pass(self.catalog.get(pick.index), a, self.rng) {
                return Some(pick);
            }
            if let Some(correction) =
                corrector.try_fix(board, self.catalog, limits.capped(), self.rng)
            {
                tracing::debug!(
                    rejected = %self.catalog.get(pick.index).id(),
                    "small piece rejected, line correction offered instead"
                );
                return Some(Pick::from_correction(correction));
            }
            limits.penalize(pick.index);
        }
        None
    }

    /// Draws a candidate among the shapes not excluded for this wave.
    fn pick_candidate(
        &mut self,
        board: &BoardOccupancy,
        limits: &SlotLimits,
        a: f64,
    ) -> Option<Pick> {
        let candidates = self
            .catalog
            .usable_indices()
            .iter()
            .copied()
            .filter(|&i| !limits.is_excluded(i))
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return None;
        }

        let reserve = self.config.reserve_cells_during_wave_build;
        let mut placeable = Vec::new();
        let mut fits = Vec::new();
        for &i in &candidates {
            let shape = self.catalog.get(i);
            if reserve {
                if let Some(fit) = try_find_fit(board, shape, self.rng) {
                    placeable.push(i);
                    fits.push(Some(fit));
                }
            } else if can_place_anywhere(board, shape) {
                placeable.push(i);
                fits.push(None);
            }
        }

        if !placeable.is_empty() {
            let pos = self.select_placeable(board, &placeable, a)?;
            return Some(Pick {
                index: placeable[pos],
                fit: fits.swap_remove(pos),
                origin: SlotOrigin::Placeable,
            });
        }

        let index = select_ignoring_placement(
            self.catalog,
            self.catalog_version,
            self.weight_cache,
            &candidates,
            ShapeWeighting::TilePower(a),
            self.rng,
        )?;
        Some(Pick {
            index,
            fit: None,
            origin: SlotOrigin::Unplaceable,
        })
    }

    #[expect(clippy::cast_precision_loss)]
    fn select_placeable(
        &mut self,
        board: &BoardOccupancy,
        placeable: &[usize],
        a: f64,
    ) -> Option<usize> {
        let selection = &self.config.selection;
        match selection.policy {
            SelectionPolicy::TilePower => select_weighted(
                self.catalog,
                placeable,
                ShapeWeighting::TilePower(a),
                self.rng,
            ),
            SelectionPolicy::Grouped => {
                let vacancy_ratio = board.vacancy() as f64 / board.area() as f64;
                GroupWeighting {
                    a,
                    beta: selection.group_beta(vacancy_ratio),
                    c: selection.difficulty_exponent,
                }
                .select(self.catalog, placeable, self.rng)
            }
        }
    }

    /// Accepts a catalog-wide spawn-weight pick, ignoring every exclusion.
    fn pick_forced(&mut self, board: &BoardOccupancy, a: f64) -> Pick {
        let usable = self.catalog.usable_indices();
        let index = select_ignoring_placement(
            self.catalog,
            self.catalog_version,
            self.weight_cache,
            usable,
            ShapeWeighting::TilePower(a),
            self.rng,
        )
        .unwrap_or(usable[0]);
        let fit = if self.config.reserve_cells_during_wave_build {
            try_find_fit(board, self.catalog.get(index), self.rng)
        } else {
            None
        };
        tracing::warn!(
            shape = %self.catalog.get(index).id(),
            "slot attempts exhausted, forcing a shape past the duplicate cap"
        );
        Pick {
            index,
            fit,
            origin: SlotOrigin::Forced,
        }
    }

    /// Overwrites slot 0 with a line correction if no slot fits the real board.
    ///
    /// Returns `true` if slot 0 was replaced.
    fn ensure_playable(&mut self, wave: &mut Wave, board: &BoardOccupancy) -> bool {
        if wave.is_empty()
            || wave
                .slots()
                .iter()
                .any(|slot| can_place_anywhere(board, &slot.shape))
        {
            return false;
        }

        let cap = self.config.duplicates_per_wave_cap;
        let others = &wave.slots()[1..];
        let excluded = self
            .catalog
            .usable_indices()
            .iter()
            .copied()
            .filter(|&i| {
                let id = self.catalog.get(i).id();
                others.iter().filter(|slot| slot.shape.id() == id).count() >= cap
            })
            .collect::<HashSet<_>>();

        let corrector = LineCorrector::new(&self.config.line_correction);
        match corrector.try_fix(board, self.catalog, &excluded, self.rng) {
            Some(correction) => {
                let shape = self.catalog.get(correction.shape).clone();
                tracing::info!(
                    shape = %shape.id(),
                    "no slot fits the board, slot 0 replaced by a line correction"
                );
                wave.slots_mut()[0] =
                    WaveSlot::new(shape, Some(correction.fit), SlotOrigin::Correction);
                true
            }
            None => {
                tracing::debug!("no slot fits the board and no line correction exists");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::core::{ShapeDefinition, ShapeId};

    fn shape(id: &str, rows: [&str; 5]) -> ShapeDefinition {
        ShapeDefinition::from_ascii(id, rows, 1.0)
    }

    fn catalog() -> ShapeCatalog {
        ShapeCatalog::new(vec![
            shape("mono", ["#....", ".....", ".....", ".....", "....."]),
            shape("I2h", ["##...", ".....", ".....", ".....", "....."]),
            shape("I3h", ["###..", ".....", ".....", ".....", "....."]),
            shape("I3v", ["#....", "#....", "#....", ".....", "....."]),
        ])
        .unwrap()
    }

    struct Parts {
        catalog: ShapeCatalog,
        config: GeneratorConfig,
        cache: WeightTableCache,
        history: WaveHistory,
        rng: Pcg32,
    }

    impl Parts {
        fn new(catalog: ShapeCatalog, config: GeneratorConfig, seed: u64) -> Self {
            Self {
                catalog,
                config,
                cache: WeightTableCache::new(),
                history: WaveHistory::new(),
                rng: Pcg32::seed_from_u64(seed),
            }
        }

        fn compose(&mut self, board: &BoardOccupancy, score: u64) -> Wave {
            WaveComposer {
                catalog: &self.catalog,
                catalog_version: 0,
                config: &self.config,
                weight_cache: &mut self.cache,
                history: &mut self.history,
                rng: &mut self.rng,
            }
            .compose(board, score, self.config.slot_count)
        }
    }

    #[test]
    fn test_slot_limits() {
        let mut limits = SlotLimits::new(2);
        limits.record(3);
        assert!(!limits.is_excluded(3));
        limits.record(3);
        assert!(limits.is_excluded(3));
        assert!(limits.capped().contains(&3));

        limits.penalize(1);
        assert!(limits.is_excluded(1));
        assert!(!limits.capped().contains(&1));
    }

    #[test]
    fn test_break_streak_picks_largest_other_shape() {
        let catalog = catalog();
        let mono = catalog.get(0).clone();
        let mut wave = Wave::new(vec![
            WaveSlot::new(mono.clone(), None, SlotOrigin::Placeable),
            WaveSlot::new(mono.clone(), None, SlotOrigin::Placeable),
        ]);
        let before = wave.signature();
        let mut rng = Pcg32::seed_from_u64(4);
        let slot = break_streak(&mut wave, &catalog, 2, 0, &mut rng).unwrap();
        assert_ne!(wave.signature(), before);
        assert!(wave.slots()[slot].origin.is_streak_break());

        let replaced = wave
            .slots()
            .iter()
            .find(|slot| slot.origin.is_streak_break())
            .unwrap();
        // I3h and I3v tie on size; catalog order wins
        assert_eq!(replaced.shape.id(), &ShapeId::from("I3h"));
        assert!(replaced.fit.is_none());
    }

    #[test]
    fn test_break_streak_respects_cap() {
        let catalog = ShapeCatalog::new(vec![
            shape("mono", ["#....", ".....", ".....", ".....", "....."]),
            shape("I2h", ["##...", ".....", ".....", ".....", "....."]),
        ])
        .unwrap();
        let wave_of = |ids: [usize; 2]| {
            Wave::new(
                ids.iter()
                    .map(|&i| WaveSlot::new(catalog.get(i).clone(), None, SlotOrigin::Placeable))
                    .collect(),
            )
        };
        let mut rng = Pcg32::seed_from_u64(0);

        // with cap 1, each shape is already at its cap
        let mut wave = wave_of([0, 1]);
        assert!(break_streak(&mut wave, &catalog, 1, 0, &mut rng).is_none());
        assert_eq!(wave, wave_of([0, 1]));
    }

    #[test]
    fn test_break_streak_skips_leading_slots() {
        let catalog = catalog();
        let mono = catalog.get(0).clone();
        for seed in 0..20 {
            let mut wave = Wave::new(vec![
                WaveSlot::new(mono.clone(), None, SlotOrigin::Correction),
                WaveSlot::new(mono.clone(), None, SlotOrigin::Placeable),
                WaveSlot::new(mono.clone(), None, SlotOrigin::Placeable),
            ]);
            let mut rng = Pcg32::seed_from_u64(seed);
            let slot = break_streak(&mut wave, &catalog, 2, 1, &mut rng).unwrap();
            assert!(slot >= 1);
            assert!(wave.slots()[0].origin.is_correction());
        }

        let mut single = Wave::new(vec![WaveSlot::new(mono, None, SlotOrigin::Correction)]);
        let mut rng = Pcg32::seed_from_u64(0);
        assert!(break_streak(&mut single, &catalog, 2, 1, &mut rng).is_none());
    }

    fn assert_sequential_fits(wave: &Wave, board: &BoardOccupancy) {
        let mut replay = board.clone();
        for slot in wave.slots() {
            if let Some(fit) = &slot.fit {
                assert!(fit.is_valid_on(&replay), "{wave}");
                replay.place(fit);
                replay.resolve_lines();
            }
        }
    }

    #[test]
    fn test_replay_fits_after_replacement() {
        let catalog = catalog();
        let board = BoardOccupancy::from_ascii("....");
        let mono = catalog.get(0).clone();
        let bar = catalog.get(1).clone();
        for seed in 0..20 {
            let mut wave = Wave::new(vec![
                WaveSlot::new(mono.clone(), None, SlotOrigin::StreakBreak),
                WaveSlot::new(
                    bar.clone(),
                    Some(PlacementFit::new(&bar, 2, 0)),
                    SlotOrigin::Placeable,
                ),
            ]);
            let mut rng = Pcg32::seed_from_u64(seed);
            replay_fits(&mut wave, &board, 0, &mut rng);
            assert!(wave.slots().iter().all(|slot| slot.fit.is_some()), "{wave}");
            assert_sequential_fits(&wave, &board);
        }
    }

    #[test]
    fn test_replay_fits_keeps_slots_before_replacement() {
        let catalog = catalog();
        let board = BoardOccupancy::from_ascii(
            "
            ....
            ....
            ",
        );
        let bar = catalog.get(1).clone();
        let kept = PlacementFit::new(&bar, 0, 0);
        let mut wave = Wave::new(vec![
            WaveSlot::new(bar.clone(), Some(kept.clone()), SlotOrigin::Placeable),
            WaveSlot::new(bar.clone(), Some(PlacementFit::new(&bar, 0, 0)), SlotOrigin::Placeable),
        ]);
        let mut rng = Pcg32::seed_from_u64(2);
        replay_fits(&mut wave, &board, 1, &mut rng);
        assert_eq!(wave.slots()[0].fit.as_ref(), Some(&kept));
        assert_ne!(wave.slots()[1].fit.as_ref(), Some(&kept));
        assert_sequential_fits(&wave, &board);
    }

    #[test]
    fn test_reservation_fits_stay_valid_after_streak_break() {
        let config = GeneratorConfig {
            streak_length: 2,
            reserve_cells_during_wave_build: true,
            small_piece_gate: crate::SmallPieceGateConfig {
                enabled: false,
                ..Default::default()
            },
            ..GeneratorConfig::default()
        };
        let board = BoardOccupancy::from_ascii(
            "
            ###...
            ......
            ......
            ",
        );
        for seed in 0..30 {
            let mut parts = Parts::new(catalog(), config.clone(), seed);
            let first = parts.compose(&board, 0);
            parts.rng = Pcg32::seed_from_u64(seed);
            let second = parts.compose(&board, 0);
            assert_ne!(first.signature(), second.signature());
            assert!(
                second.slots().iter().any(|slot| slot.origin.is_streak_break()),
                "{second}"
            );
            assert_sequential_fits(&second, &board);
        }
    }

    fn gate_rejecting_small_shapes() -> crate::SmallPieceGateConfig {
        let never = crate::SuccessPercent {
            at_a_min: 0.0,
            at_a_max: 0.0,
        };
        crate::SmallPieceGateConfig {
            enabled: true,
            tile_threshold: 3,
            success_table: (1..=3).map(|tiles| (tiles, never)).collect(),
        }
    }

    #[test]
    fn test_gate_rejection_offers_line_correction() {
        let config = GeneratorConfig {
            small_piece_gate: gate_rejecting_small_shapes(),
            ..GeneratorConfig::default()
        };
        let board = BoardOccupancy::from_ascii(
            "
            ###.
            ....
            ....
            ....
            ",
        );
        for seed in 0..20 {
            let mut parts = Parts::new(catalog(), config.clone(), seed);
            let wave = parts.compose(&board, 0);
            for slot in wave.slots() {
                assert!(slot.origin.is_correction(), "{wave}");
                let fit = slot.fit.as_ref().unwrap();
                assert!(fit.is_valid_on(&board));
            }
        }
    }

    #[test]
    fn test_gate_rejection_without_correction_retries() {
        let mut shapes = catalog().iter().cloned().collect::<Vec<_>>();
        shapes.push(shape("O4", ["##...", "##...", ".....", ".....", "....."]));
        let config = GeneratorConfig {
            duplicates_per_wave_cap: 3,
            small_piece_gate: gate_rejecting_small_shapes(),
            line_correction: crate::LineCorrectionConfig {
                scan_rows: false,
                scan_cols: false,
                ..Default::default()
            },
            ..GeneratorConfig::default()
        };
        let board = BoardOccupancy::new(8, 8).unwrap();
        for seed in 0..20 {
            let catalog = ShapeCatalog::new(shapes.clone()).unwrap();
            let mut parts = Parts::new(catalog, config.clone(), seed);
            let wave = parts.compose(&board, 0);
            for slot in wave.slots() {
                assert_eq!(slot.shape.id(), &ShapeId::from("O4"), "{wave}");
                assert!(slot.origin.is_placeable());
            }
        }
    }

    #[test]
    fn test_grouped_selection_waves() {
        let config = GeneratorConfig {
            selection: crate::SelectionConfig {
                policy: SelectionPolicy::Grouped,
                ..Default::default()
            },
            small_piece_gate: crate::SmallPieceGateConfig {
                enabled: false,
                ..Default::default()
            },
            ..GeneratorConfig::default()
        };
        let mut parts = Parts::new(ShapeCatalog::standard(), config, 5);
        let boards = [
            BoardOccupancy::new(8, 8).unwrap(),
            BoardOccupancy::from_ascii(
                "
                ########
                ########
                ###..###
                ###..###
                ########
                ########
                ########
                ########
                ",
            ),
        ];
        for board in &boards {
            for score in (0..10_000).step_by(1000) {
                let wave = parts.compose(board, score);
                assert_eq!(wave.len(), 3);
                for slot in wave.slots() {
                    assert!(!slot.origin.is_forced(), "{wave}");
                    assert!(wave.count_of(slot.shape.id()) <= 2, "{wave}");
                    if slot.origin.is_placeable() {
                        assert!(can_place_anywhere(board, &slot.shape), "{wave}");
                    }
                }
            }
        }
    }

    fn weighted_catalog() -> ShapeCatalog {
        ShapeCatalog::new(vec![
            ShapeDefinition::from_ascii("mono", ["#....", ".....", ".....", ".....", "....."], 1.0),
            ShapeDefinition::from_ascii("I2h", ["##...", ".....", ".....", ".....", "....."], 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_ignoring_placement_uses_spawn_weight() {
        let catalog = weighted_catalog();
        let mut cache = WeightTableCache::new();
        let mut rng = Pcg32::seed_from_u64(8);
        let fallback = ShapeWeighting::TilePower(1.0);
        for _ in 0..200 {
            let index = select_ignoring_placement(
                &catalog,
                0,
                &mut cache,
                catalog.usable_indices(),
                fallback,
                &mut rng,
            );
            assert_eq!(index, Some(0));
        }
        // only zero-weight candidates left
        let index = select_ignoring_placement(&catalog, 0, &mut cache, &[1], fallback, &mut rng);
        assert_eq!(index, Some(1));
    }

    #[test]
    fn test_unplaceable_and_forced_picks_use_spawn_weight() {
        let board = BoardOccupancy::from_ascii(
            "
            ##
            ##
            ",
        );
        let config = GeneratorConfig {
            duplicates_per_wave_cap: 1,
            small_piece_gate: crate::SmallPieceGateConfig {
                enabled: false,
                ..Default::default()
            },
            ..GeneratorConfig::default()
        };
        for seed in 0..20 {
            let mut parts = Parts::new(weighted_catalog(), config.clone(), seed);
            let wave = parts.compose(&board, 0);
            let ids = wave.shape_ids().map(ShapeId::as_str).collect::<Vec<_>>();
            let origins = wave.slots().iter().map(|slot| slot.origin).collect::<Vec<_>>();
            assert_eq!(ids, ["mono", "I2h", "mono"]);
            assert_eq!(
                origins,
                [SlotOrigin::Unplaceable, SlotOrigin::Unplaceable, SlotOrigin::Forced]
            );
        }
    }

    #[test]
    fn test_regular_waves_respect_the_cap() {
        let config = GeneratorConfig {
            slot_count: 3,
            duplicates_per_wave_cap: 1,
            small_piece_gate: crate::SmallPieceGateConfig {
                enabled: false,
                ..Default::default()
            },
            ..GeneratorConfig::default()
        };
        let mut parts = Parts::new(catalog(), config, 12);
        let board = BoardOccupancy::new(8, 8).unwrap();
        for score in (0..20_000).step_by(500) {
            let wave = parts.compose(&board, score);
            assert_eq!(wave.len(), 3);
            for slot in wave.slots() {
                assert!(!slot.origin.is_forced());
                assert_eq!(wave.count_of(slot.shape.id()), 1, "{wave}");
            }
        }
    }

    #[test]
    fn test_reservation_mode_fits_do_not_overlap() {
        let config = GeneratorConfig {
            reserve_cells_during_wave_build: true,
            small_piece_gate: crate::SmallPieceGateConfig {
                enabled: false,
                ..Default::default()
            },
            ..GeneratorConfig::default()
        };
        let board = BoardOccupancy::from_ascii(
            "
            ......
            ......
            ......
            ",
        );
        for seed in 0..30 {
            let mut parts = Parts::new(catalog(), config.clone(), seed);
            let wave = parts.compose(&board, 0);
            let mut occupied = board.clone();
            for slot in wave.slots() {
                let fit = slot.fit.as_ref().unwrap();
                assert!(fit.is_valid_on(&occupied), "{wave}");
                occupied.place(fit);
                occupied.resolve_lines();
            }
        }
    }

    #[test]
    fn test_unplayable_wave_gets_slot_zero_correction() {
        let catalog = ShapeCatalog::new(vec![
            shape("I3h", ["###..", ".....", ".....", ".....", "....."]),
            shape("mono", ["#....", ".....", ".....", ".....", "....."]),
        ])
        .unwrap();
        let board = BoardOccupancy::from_ascii(
            "
            ####
            ##.#
            ####
            ",
        );
        let bar = catalog.get(0).clone();
        let mut parts = Parts::new(catalog, GeneratorConfig::default(), 1);
        let mut wave = Wave::new(vec![
            WaveSlot::new(bar.clone(), None, SlotOrigin::Placeable),
            WaveSlot::new(bar.clone(), None, SlotOrigin::Unplaceable),
            WaveSlot::new(bar, None, SlotOrigin::Unplaceable),
        ]);
        WaveComposer {
            catalog: &parts.catalog,
            catalog_version: 0,
            config: &parts.config,
            weight_cache: &mut parts.cache,
            history: &mut parts.history,
            rng: &mut parts.rng,
        }
        .ensure_playable(&mut wave, &board);

        let slot = &wave.slots()[0];
        assert!(slot.origin.is_correction());
        assert_eq!(slot.shape.id(), &ShapeId::from("mono"));
        assert_eq!(slot.fit.as_ref().unwrap().covered(), &[(2, 1)]);
    }

    #[test]
    fn test_unplayable_wave_without_correction_is_kept() {
        let catalog = catalog();
        // every line has two gaps
        let board = BoardOccupancy::from_ascii(
            "
            #.#.
            .#.#
            #.#.
            .#.#
            ",
        );
        let bar = catalog.get(2).clone();
        let mut parts = Parts::new(catalog, GeneratorConfig::default(), 1);
        let mut wave = Wave::new(vec![WaveSlot::new(bar, None, SlotOrigin::Unplaceable)]);
        let before = wave.clone();
        WaveComposer {
            catalog: &parts.catalog,
            catalog_version: 0,
            config: &parts.config,
            weight_cache: &mut parts.cache,
            history: &mut parts.history,
            rng: &mut parts.rng,
        }
        .ensure_playable(&mut wave, &board);
        assert_eq!(wave, before);
    }
}
