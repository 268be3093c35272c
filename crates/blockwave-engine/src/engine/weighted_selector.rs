//! Weighted random choice over shapes.
//!
//! All selection modes sample from a [`WeightTable`]: a prefix-sum table over
//! non-negative weights. A uniform value `u ∈ [0, total)` is drawn and the
//! first entry whose cumulative weight exceeds `u` is chosen, so ties resolve
//! to the earliest entry.
//!
//! Modes:
//!
//! - [`ShapeWeighting::Static`] - the catalog's `spawn_weight`, for picks that ignore placement
//! - [`ShapeWeighting::TilePower`] - `max(tiles, 1)^a`, favors larger shapes as `a` grows
//! - [`ShapeWeighting::InverseTilePower`] - `1 / max(tiles, 1)^a`, used by revives
//! - [`GroupWeighting`] - two-stage pick: a tile-count group, then a shape in it
//!
//! Tables covering the whole catalog are kept in a [`WeightTableCache`] keyed
//! by catalog version and weighting; tables are never modified once built.

use std::collections::{BTreeMap, HashMap};

use rand::{Rng, seq::IndexedRandom as _};

use crate::core::{ShapeCatalog, ShapeDefinition};

/// Prefix sums over a list of non-negative weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    cumulative: Vec<f64>,
}

impl WeightTable {
    /// Builds the table. Negative and non-finite weights count as zero.
    pub fn new<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut total = 0.0;
        let cumulative = weights
            .into_iter()
            .map(|w| {
                if w.is_finite() && w > 0.0 {
                    total += w;
                }
                total
            })
            .collect();
        Self { cumulative }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Draws an entry index, or `None` if the total weight is zero.
    pub fn sample<R>(&self, rng: &mut R) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        let u = rng.random_range(0.0..total);
        self.cumulative
            .iter()
            .position(|&c| c > u)
            .or(Some(self.cumulative.len() - 1))
    }
}

/// Per-shape weighting used by single-stage selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeWeighting {
    Static,
    TilePower(f64),
    InverseTilePower(f64),
}

impl ShapeWeighting {
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn weight(self, shape: &ShapeDefinition) -> f64 {
        let tiles = shape.active_cell_count().max(1) as f64;
        match self {
            Self::Static => shape.spawn_weight(),
            Self::TilePower(a) => tiles.powf(a),
            Self::InverseTilePower(a) => 1.0 / tiles.powf(a),
        }
    }

    fn key(self) -> WeightingKey {
        match self {
            Self::Static => WeightingKey::Static,
            Self::TilePower(a) => WeightingKey::TilePower(a.to_bits()),
            Self::InverseTilePower(a) => WeightingKey::InverseTilePower(a.to_bits()),
        }
    }
}

/// Picks one of `candidates` (catalog indices) with the given weighting.
///
/// Returns the position within `candidates`.
pub fn select_weighted<R>(
    catalog: &ShapeCatalog,
    candidates: &[usize],
    weighting: ShapeWeighting,
    rng: &mut R,
) -> Option<usize>
where
    R: Rng + ?Sized,
{
    WeightTable::new(
        candidates
            .iter()
            .map(|&i| weighting.weight(catalog.get(i))),
    )
    .sample(rng)
}

/// Exponents of the two-stage (group, then item) selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupWeighting {
    /// Difficulty exponent `a`; groups are weighted by `(1/tiles)^a`.
    pub a: f64,
    /// Group-size exponent `β`; groups are also weighted by `size^β`.
    pub beta: f64,
    /// Within a group, shapes are weighted by `difficulty_score^c`.
    pub c: f64,
}

impl GroupWeighting {
    /// Picks one of `candidates` (catalog indices) in two stages.
    ///
    /// Candidates are bucketed by active cell count. A bucket is drawn with
    /// weight `(1/tiles)^a · size^β`, then a shape within it with weight
    /// `difficulty_score^c`. If every shape in the drawn bucket has zero
    /// weight, the shape is drawn uniformly.
    ///
    /// Returns the position within `candidates`.
    #[expect(clippy::cast_precision_loss)]
    pub fn select<R>(
        &self,
        catalog: &ShapeCatalog,
        candidates: &[usize],
        rng: &mut R,
    ) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        let mut groups = BTreeMap::<usize, Vec<usize>>::new();
        for (pos, &i) in candidates.iter().enumerate() {
            groups
                .entry(catalog.get(i).active_cell_count())
                .or_default()
                .push(pos);
        }
        let groups = groups.into_iter().collect::<Vec<_>>();

        let group_table = WeightTable::new(groups.iter().map(|(tiles, members)| {
            let tiles = (*tiles).max(1) as f64;
            (1.0 / tiles).powf(self.a) * (members.len() as f64).powf(self.beta)
        }));
        let (_, members) = &groups[group_table.sample(rng)?];

        let item_table = WeightTable::new(
            members
                .iter()
                .map(|&pos| catalog.get(candidates[pos]).difficulty_score().powf(self.c)),
        );
        match item_table.sample(rng) {
            Some(k) => Some(members[k]),
            None => members.choose(rng).copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WeightingKey {
    Static,
    TilePower(u64),
    InverseTilePower(u64),
}

/// Cache of catalog-wide weight tables.
///
/// Entries are keyed by `(catalog version, weighting)`. Each table covers the
/// catalog's usable shapes in order and is built by a pure function of the
/// catalog and the weighting, so a stale entry can only come from reusing a
/// version number; bump the version on every catalog reload.
#[derive(Debug, Clone, Default)]
pub struct WeightTableCache {
    tables: HashMap<(u64, WeightingKey), WeightTable>,
}

impl WeightTableCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table for the catalog's usable shapes, building it if needed.
    pub fn get_or_build(
        &mut self,
        catalog: &ShapeCatalog,
        version: u64,
        weighting: ShapeWeighting,
    ) -> &WeightTable {
        self.tables
            .entry((version, weighting.key()))
            .or_insert_with(|| {
                WeightTable::new(
                    catalog
                        .usable_indices()
                        .iter()
                        .map(|&i| weighting.weight(catalog.get(i))),
                )
            })
    }

    /// Drops every table built for a catalog version other than `version`.
    pub fn retain_version(&mut self, version: u64) {
        self.tables.retain(|(v, _), _| *v == version);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Picks a usable catalog shape with the cached table; returns its catalog index.
    pub fn select_from_catalog<R>(
        &mut self,
        catalog: &ShapeCatalog,
        version: u64,
        weighting: ShapeWeighting,
        rng: &mut R,
    ) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        let table = self.get_or_build(catalog, version, weighting);
        let pos = table.sample(rng)?;
        Some(catalog.usable_indices()[pos])
    }
}
