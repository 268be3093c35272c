//! Core data structures: shapes, the catalog, board occupancy and placements.
//!
//! - [`ShapeDefinition`] - A 5×5 piece definition with derived tile count and bounds
//! - [`ShapeCatalog`] - The immutable, ordered set of shapes offered by the game
//! - [`BoardQuery`] - Read-only view of the live board supplied by the caller
//! - [`BoardOccupancy`] - Bit-row occupancy grid used for snapshots and simulation
//! - [`PlacementFit`] - A concrete placement of a shape on a board
//! - [`OffsetScan`] - Randomized wraparound iteration over placement offsets

pub use self::{board::*, catalog::*, placement::*, shape::*};

pub(crate) mod board;
pub(crate) mod catalog;
pub(crate) mod placement;
pub(crate) mod shape;
