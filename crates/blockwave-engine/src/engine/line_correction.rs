//! Board repair: finding a shape that exactly closes a near-complete line.
//!
//! The search runs in three phases:
//!
//! 1. **Scan** - every row and/or column is checked for a single gap: one
//!    maximal run of free cells, no longer than the configured maximum, with
//!    every other cell of the line occupied. Such gaps are [`LineRun`]s.
//! 2. **Enumerate** - for each run, every usable catalog shape that is not
//!    excluded and has at least as many tiles as the run is long.
//! 3. **Exact fit** - a randomized-wraparound offset search (the same one
//!    [`try_find_fit`](super::fit_finder::try_find_fit) uses) for a placement
//!    whose cells on the run's line cover the run exactly and whose other
//!    cells land on free cells.
//!
//! At most one placement is kept per `(run, shape)` pair, collection stops at
//! the pair budget, and the result is drawn uniformly from what was
//! collected. Applying the result always fills the targeted line completely;
//! clearing it is up to whoever owns the board.

use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;

use crate::core::{Axis, BoardOccupancy, OffsetScan, PlacementFit, ShapeCatalog, ShapeDefinition};

use super::config::LineCorrectionConfig;

/// The only gap of an otherwise fully occupied line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineRun {
    pub axis: Axis,
    /// Row index for [`Axis::Row`], column index for [`Axis::Column`].
    pub index: usize,
    /// Position of the first free cell along the line.
    pub start: usize,
    pub len: usize,
}

impl LineRun {
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        (self.start..self.start + self.len).contains(&pos)
    }

    /// Board cells of the run, as `(x, y)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.start..self.start + self.len).map(move |pos| match self.axis {
            Axis::Row => (pos, self.index),
            Axis::Column => (self.index, pos),
        })
    }

    /// Splits a board cell into `(line index, position along the line)` for this axis.
    fn locate(&self, x: usize, y: usize) -> (usize, usize) {
        match self.axis {
            Axis::Row => (y, x),
            Axis::Column => (x, y),
        }
    }
}

/// A placement that closes a line exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Catalog index of the shape.
    pub shape: usize,
    pub fit: PlacementFit,
    pub run: LineRun,
}

/// Finds the single gap of a line, if the line has exactly one.
///
/// Returns `(start, len)`. A line without free cells has no gap.
#[must_use]
pub fn single_gap(board: &BoardOccupancy, axis: Axis, index: usize) -> Option<(usize, usize)> {
    let mut gap = None;
    let mut pos = 0;
    let len = board.line_len(axis);
    while pos < len {
        if board.is_line_cell_occupied(axis, index, pos) {
            pos += 1;
            continue;
        }
        if gap.is_some() {
            return None;
        }
        let start = pos;
        while pos < len && !board.is_line_cell_occupied(axis, index, pos) {
            pos += 1;
        }
        gap = Some((start, pos - start));
    }
    gap
}

/// Line correction search over a board.
#[derive(Debug, Clone, Copy)]
pub struct LineCorrector<'a> {
    config: &'a LineCorrectionConfig,
}

impl<'a> LineCorrector<'a> {
    #[must_use]
    pub fn new(config: &'a LineCorrectionConfig) -> Self {
        Self { config }
    }

    /// Collects every line whose only gap is short enough to be corrected.
    ///
    /// Rows come first, then columns; at most `pair_budget` runs are returned.
    #[must_use]
    pub fn scan(&self, board: &BoardOccupancy) -> Vec<LineRun> {
        let mut axes = Vec::with_capacity(2);
        if self.config.scan_rows {
            axes.push(Axis::Row);
        }
        if self.config.scan_cols {
            axes.push(Axis::Column);
        }

        axes.into_iter()
            .flat_map(|axis| {
                let max_len = self
                    .config
                    .max_run_length
                    .unwrap_or_else(|| board.line_len(axis));
                (0..board.line_count(axis)).filter_map(move |index| {
                    let (start, len) = single_gap(board, axis, index)?;
                    (len <= max_len).then_some(LineRun {
                        axis,
                        index,
                        start,
                        len,
                    })
                })
            })
            .take(self.config.pair_budget)
            .collect()
    }

    /// Searches for a shape that exactly closes one of the board's gaps.
    ///
    /// Shapes whose catalog index is in `excluded` are not considered.
    /// Returns `None` when no line has a correctable gap or no shape closes
    /// any of them; this is an ordinary outcome.
    pub fn try_fix<R>(
        &self,
        board: &BoardOccupancy,
        catalog: &ShapeCatalog,
        excluded: &HashSet<usize>,
        rng: &mut R,
    ) -> Option<Correction>
    where
        R: Rng + ?Sized,
    {
        let runs = self.scan(board);
        let mut candidates = Vec::new();

        'runs: for run in &runs {
            for &index in catalog.usable_indices() {
                if excluded.contains(&index) {
                    continue;
                }
                let shape = catalog.get(index);
                if shape.active_cell_count() < run.len {
                    continue;
                }
                let Some((x, y)) = OffsetScan::randomized(board, shape, rng)
                    .find(|&(x, y)| closes_exactly(board, shape, run, x, y))
                else {
                    continue;
                };
                candidates.push(Correction {
                    shape: index,
                    fit: PlacementFit::new(shape, x, y),
                    run: *run,
                });
                if candidates.len() >= self.config.pair_budget {
                    break 'runs;
                }
            }
        }

        tracing::trace!(
            runs = runs.len(),
            candidates = candidates.len(),
            "line correction search"
        );

        if candidates.is_empty() {
            return None;
        }
        let chosen = rng.random_range(0..candidates.len());
        Some(candidates.swap_remove(chosen))
    }
}

/// Whether `shape` at `(x, y)` covers `run` exactly without touching occupied cells.
///
/// The placement must be in bounds.
fn closes_exactly(
    board: &BoardOccupancy,
    shape: &ShapeDefinition,
    run: &LineRun,
    x: usize,
    y: usize,
) -> bool {
    let mut on_line = 0;
    for (dx, dy) in shape.relative_cells() {
        let (cx, cy) = (x + dx, y + dy);
        let (line, pos) = run.locate(cx, cy);
        if line == run.index {
            if !run.contains(pos) {
                return false;
            }
            on_line += 1;
        } else if board.is_occupied(cx, cy) {
            return false;
        }
    }
    on_line == run.len
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn shape(id: &str, rows: [&str; 5]) -> ShapeDefinition {
        ShapeDefinition::from_ascii(id, rows, 1.0)
    }

    fn domino_h() -> ShapeDefinition {
        shape("I2h", ["##...", ".....", ".....", ".....", "....."])
    }

    fn domino_v() -> ShapeDefinition {
        shape("I2v", ["#....", "#....", ".....", ".....", "....."])
    }

    fn line_is_full(board: &BoardOccupancy, run: &LineRun) -> bool {
        (0..board.line_len(run.axis))
            .all(|pos| board.is_line_cell_occupied(run.axis, run.index, pos))
    }

    #[test]
    fn test_single_gap() {
        let board = BoardOccupancy::from_ascii(
            "
            ###..#
            ......
            #.#..#
            ######
            ",
        );
        assert_eq!(single_gap(&board, Axis::Row, 0), Some((3, 2)));
        assert_eq!(single_gap(&board, Axis::Row, 1), Some((0, 6)));
        assert_eq!(single_gap(&board, Axis::Row, 2), None);
        assert_eq!(single_gap(&board, Axis::Row, 3), None);
        assert_eq!(single_gap(&board, Axis::Column, 0), Some((1, 1)));
        assert_eq!(single_gap(&board, Axis::Column, 3), Some((0, 3)));
    }

    #[test]
    fn test_scan_respects_axes_and_max_length() {
        let board = BoardOccupancy::from_ascii(
            "
            ###..#
            ......
            ######
            ",
        );
        let config = LineCorrectionConfig {
            max_run_length: Some(2),
            scan_cols: false,
            ..LineCorrectionConfig::default()
        };
        let runs = LineCorrector::new(&config).scan(&board);
        assert_eq!(
            runs,
            vec![LineRun {
                axis: Axis::Row,
                index: 0,
                start: 3,
                len: 2,
            }]
        );

        let config = LineCorrectionConfig::default();
        let runs = LineCorrector::new(&config).scan(&board);
        assert!(runs.iter().any(|run| run.axis.is_row() && run.index == 1));
        assert!(runs.iter().any(|run| run.axis.is_column() && run.index == 3));
    }

    #[test]
    fn test_closes_two_cell_gap_with_horizontal_domino() {
        let board = BoardOccupancy::from_ascii(
            "
            ......
            ......
            ###..#
            ......
            ......
            ......
            ",
        );
        let catalog = ShapeCatalog::new(vec![domino_h()]).unwrap();
        let config = LineCorrectionConfig::default();
        let corrector = LineCorrector::new(&config);

        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let correction = corrector
                .try_fix(&board, &catalog, &HashSet::new(), &mut rng)
                .unwrap();
            assert_eq!(correction.shape, 0);
            assert_eq!(correction.fit.covered(), &[(3, 2), (4, 2)]);

            let mut fixed = board.clone();
            fixed.place(&correction.fit);
            assert!(line_is_full(&fixed, &correction.run));
        }
    }

    #[test]
    fn test_shape_may_extend_off_the_line_onto_free_cells() {
        let board = BoardOccupancy::from_ascii(
            "
            ....
            ....
            .###
            ",
        );
        let catalog = ShapeCatalog::new(vec![domino_h(), domino_v()]).unwrap();
        let config = LineCorrectionConfig {
            scan_cols: false,
            ..LineCorrectionConfig::default()
        };
        let mut rng = Pcg32::seed_from_u64(8);
        let correction = LineCorrector::new(&config)
            .try_fix(&board, &catalog, &HashSet::new(), &mut rng)
            .unwrap();
        assert_eq!(correction.shape, 1);
        assert_eq!(correction.fit.covered(), &[(0, 1), (0, 2)]);
    }

    #[test]
    fn test_excluded_and_too_small_shapes_are_skipped() {
        let board = BoardOccupancy::from_ascii(
            "
            ##...#
            ######
            ",
        );
        let catalog = ShapeCatalog::new(vec![
            domino_h(),
            shape("I3h", ["###..", ".....", ".....", ".....", "....."]),
        ])
        .unwrap();
        let config = LineCorrectionConfig {
            scan_cols: false,
            ..LineCorrectionConfig::default()
        };
        let corrector = LineCorrector::new(&config);
        let mut rng = Pcg32::seed_from_u64(2);

        let correction = corrector
            .try_fix(&board, &catalog, &HashSet::new(), &mut rng)
            .unwrap();
        assert_eq!(correction.shape, 1);

        let excluded = HashSet::from([1]);
        assert!(corrector.try_fix(&board, &catalog, &excluded, &mut rng).is_none());
    }

    #[test]
    fn test_no_gap_no_fix() {
        let catalog = ShapeCatalog::standard();
        let mut rng = Pcg32::seed_from_u64(0);

        let full = BoardOccupancy::from_ascii(
            "
            ###
            ###
            ",
        );
        let config = LineCorrectionConfig::default();
        assert!(
            LineCorrector::new(&config)
                .try_fix(&full, &catalog, &HashSet::new(), &mut rng)
                .is_none()
        );

        let empty = BoardOccupancy::new(4, 4).unwrap();
        let config = LineCorrectionConfig {
            scan_rows: false,
            scan_cols: false,
            ..LineCorrectionConfig::default()
        };
        assert!(LineCorrector::new(&config).scan(&empty).is_empty());
        assert!(
            LineCorrector::new(&config)
                .try_fix(&empty, &catalog, &HashSet::new(), &mut rng)
                .is_none()
        );
    }

    #[test]
    fn test_every_result_fills_its_line() {
        let board = BoardOccupancy::from_ascii(
            "
            ########
            ###...##
            ########
            #.######
            #.######
            ####.###
            ........
            #######.
            ",
        );
        let catalog = ShapeCatalog::standard();
        let config = LineCorrectionConfig::default();
        let corrector = LineCorrector::new(&config);
        let mut rng = Pcg32::seed_from_u64(99);
        let mut targets = HashSet::new();
        for _ in 0..100 {
            let correction = corrector
                .try_fix(&board, &catalog, &HashSet::new(), &mut rng)
                .unwrap();
            assert!(correction.fit.is_valid_on(&board));
            let mut fixed = board.clone();
            fixed.place(&correction.fit);
            assert!(line_is_full(&fixed, &correction.run));
            targets.insert(correction.run);
        }
        assert!(targets.len() > 1);
    }

    #[test]
    fn test_pair_budget_limits_collection() {
        let board = BoardOccupancy::from_ascii(
            "
            #.######
            ",
        );
        let catalog = ShapeCatalog::standard();
        let config = LineCorrectionConfig {
            pair_budget: 1,
            ..LineCorrectionConfig::default()
        };
        let mut rng = Pcg32::seed_from_u64(6);
        let correction = LineCorrector::new(&config)
            .try_fix(&board, &catalog, &HashSet::new(), &mut rng)
            .unwrap();
        assert_eq!(catalog.get(correction.shape).id().as_str(), "mono");
    }
}
