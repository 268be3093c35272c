use arrayvec::ArrayVec;
use rand::Rng;
use serde::Serialize;

use super::{
    board::BoardOccupancy,
    shape::{MAX_SHAPE_CELLS, ShapeDefinition},
};

/// A concrete placement of a shape on a board.
///
/// `(x, y)` is where the top-left corner of the shape's bounding box lands.
/// `covered` lists the board cells, as `(x, y)`, occupied by the shape's
/// active cells at that offset. Its length always equals the shape's active
/// cell count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementFit {
    x: usize,
    y: usize,
    covered: ArrayVec<(usize, usize), MAX_SHAPE_CELLS>,
}

impl PlacementFit {
    /// Computes the covered cells of `shape` at offset `(x, y)`.
    ///
    /// Does not check the board; use [`BoardOccupancy::fits`] first.
    #[must_use]
    pub fn new(shape: &ShapeDefinition, x: usize, y: usize) -> Self {
        let covered = shape
            .relative_cells()
            .map(|(dx, dy)| (x + dx, y + dy))
            .collect();
        Self { x, y, covered }
    }

    #[must_use]
    pub fn x(&self) -> usize {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> usize {
        self.y
    }

    #[must_use]
    pub fn covered(&self) -> &[(usize, usize)] {
        &self.covered
    }

    /// Whether every covered cell is in bounds and unoccupied on `board`.
    #[must_use]
    pub fn is_valid_on(&self, board: &BoardOccupancy) -> bool {
        self.covered
            .iter()
            .all(|&(x, y)| x < board.cols() && y < board.rows() && !board.is_occupied(x, y))
    }
}

/// Iterator over every placement offset of a shape, rotated from a start point.
///
/// Offsets range over `oy ∈ [0, y_count)` and `ox ∈ [0, x_count)`. The scan is
/// row-major starting from `(start_oy, start_ox)`, each axis wrapping around
/// independently, so every offset is visited exactly once whatever the start.
/// Randomizing the start removes the bias toward low-index placements a plain
/// scan would have.
///
/// Yields `(ox, oy)` pairs.
#[derive(Debug, Clone)]
pub struct OffsetScan {
    x_count: usize,
    y_count: usize,
    start_ox: usize,
    start_oy: usize,
    index: usize,
}

impl OffsetScan {
    /// Scan over all offsets of `shape` on `board`, starting at `(0, 0)`.
    ///
    /// Empty if the shape's bounding box does not fit on the board.
    #[must_use]
    pub fn new(board: &BoardOccupancy, shape: &ShapeDefinition) -> Self {
        let bounds = shape.bounds();
        let x_count = (board.cols() + 1).saturating_sub(bounds.width);
        let y_count = (board.rows() + 1).saturating_sub(bounds.height);
        Self::with_start(x_count, y_count, 0, 0)
    }

    /// Like [`Self::new`], but starting from a uniformly random offset.
    #[must_use]
    pub fn randomized<R>(board: &BoardOccupancy, shape: &ShapeDefinition, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut scan = Self::new(board, shape);
        if scan.x_count > 0 && scan.y_count > 0 {
            scan.start_oy = rng.random_range(0..scan.y_count);
            scan.start_ox = rng.random_range(0..scan.x_count);
        }
        scan
    }

    #[must_use]
    pub fn with_start(x_count: usize, y_count: usize, start_ox: usize, start_oy: usize) -> Self {
        Self {
            x_count,
            y_count,
            start_ox,
            start_oy,
            index: 0,
        }
    }

    fn total(&self) -> usize {
        self.x_count * self.y_count
    }
}

impl Iterator for OffsetScan {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.total() {
            return None;
        }
        let oy = (self.start_oy + self.index / self.x_count) % self.y_count;
        let ox = (self.start_ox + self.index % self.x_count) % self.x_count;
        self.index += 1;
        Some((ox, oy))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for OffsetScan {}
