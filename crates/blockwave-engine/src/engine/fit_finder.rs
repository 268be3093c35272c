//! Placement search for a single shape.

use rand::Rng;

use crate::core::{BoardOccupancy, OffsetScan, PlacementFit, ShapeDefinition};

/// Finds a legal placement of `shape` on `board`.
///
/// Every offset of the shape's bounding box is visited exactly once, starting
/// from a uniformly random offset and wrapping around (see [`OffsetScan`]).
/// The first offset at which all active cells land on unoccupied cells wins.
///
/// Returns `None` if no offset works, if the shape does not fit within the
/// board at all, or if the shape has no active cell. The board is never
/// modified.
pub fn try_find_fit<R>(
    board: &BoardOccupancy,
    shape: &ShapeDefinition,
    rng: &mut R,
) -> Option<PlacementFit>
where
    R: Rng + ?Sized,
{
    if shape.is_empty() {
        return None;
    }
    OffsetScan::randomized(board, shape, rng)
        .find(|&(x, y)| !board.is_colliding(shape, x, y))
        .map(|(x, y)| PlacementFit::new(shape, x, y))
}

/// Whether `shape` fits anywhere on `board`.
///
/// Same test as [`try_find_fit`] without drawing a random start.
#[must_use]
pub fn can_place_anywhere(board: &BoardOccupancy, shape: &ShapeDefinition) -> bool {
    !shape.is_empty()
        && OffsetScan::new(board, shape).any(|(x, y)| !board.is_colliding(shape, x, y))
}
