use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::ShapeError;

/// Side length of the square grid every shape is defined on.
pub const SHAPE_GRID_SIZE: usize = 5;

/// Maximum number of active cells a shape can have.
pub const MAX_SHAPE_CELLS: usize = SHAPE_GRID_SIZE * SHAPE_GRID_SIZE;

/// Identifier of a shape within a catalog.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Tight bounding box of a shape's active cells within its 5×5 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeBounds {
    pub min_x: usize,
    pub min_y: usize,
    pub width: usize,
    pub height: usize,
}

impl ShapeBounds {
    /// Bounds used for a shape without any active cell.
    pub const DEGENERATE: Self = Self {
        min_x: 0,
        min_y: 0,
        width: 1,
        height: 1,
    };
}

/// A piece definition on a 5×5 occupancy grid.
///
/// The grid is indexed as `cells[y][x]`. Everything else about the shape is
/// derived from the grid when the definition is built and never read back
/// from stored data:
///
/// - the active cell count (number of `true` cells),
/// - the tight bounding box,
/// - one bit mask per bounding-box row, used for collision tests against
///   [`BoardOccupancy`](super::board::BoardOccupancy) rows.
///
/// A shape without any active cell is considered malformed. It keeps the
/// 1×1 [`ShapeBounds::DEGENERATE`] box so that bounds arithmetic stays valid,
/// and the generator skips it when enumerating candidates.
///
/// # Serialization
///
/// Shapes (de)serialize as a record with the grid written as ASCII rows,
/// `'#'` for an active cell and `'.'` for an empty one:
///
/// ```
/// use blockwave_engine::ShapeDefinition;
///
/// let json = r###"{
///     "id": "L3",
///     "cells": ["#....", "##...", ".....", ".....", "....."],
///     "spawn_weight": 2.0,
///     "difficulty_score": 1.5
/// }"###;
/// let shape: ShapeDefinition = serde_json::from_str(json).unwrap();
/// assert_eq!(shape.active_cell_count(), 3);
/// assert_eq!(shape.bounds().width, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ShapeRecord", into = "ShapeRecord")]
pub struct ShapeDefinition {
    id: ShapeId,
    cells: [[bool; SHAPE_GRID_SIZE]; SHAPE_GRID_SIZE],
    spawn_weight: f64,
    difficulty_score: f64,
    active_cell_count: usize,
    bounds: ShapeBounds,
    row_masks: ArrayVec<u64, SHAPE_GRID_SIZE>,
}

/// Serialized form of a [`ShapeDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub id: ShapeId,
    pub cells: Vec<String>,
    #[serde(default = "default_spawn_weight")]
    pub spawn_weight: f64,
    #[serde(default = "default_difficulty_score")]
    pub difficulty_score: f64,
}

fn default_spawn_weight() -> f64 {
    1.0
}

fn default_difficulty_score() -> f64 {
    1.0
}

impl TryFrom<ShapeRecord> for ShapeDefinition {
    type Error = ShapeError;

    fn try_from(record: ShapeRecord) -> Result<Self, Self::Error> {
        let rows = record.cells.iter().map(String::as_str).collect::<Vec<_>>();
        let cells = parse_grid(&rows)?;
        Self::new(record.id, cells, record.spawn_weight, record.difficulty_score)
    }
}

impl From<ShapeDefinition> for ShapeRecord {
    fn from(shape: ShapeDefinition) -> Self {
        let cells = shape
            .cells
            .iter()
            .map(|row| row.iter().map(|&c| if c { '#' } else { '.' }).collect())
            .collect();
        Self {
            id: shape.id,
            cells,
            spawn_weight: shape.spawn_weight,
            difficulty_score: shape.difficulty_score,
        }
    }
}

fn parse_grid(rows: &[&str]) -> Result<[[bool; SHAPE_GRID_SIZE]; SHAPE_GRID_SIZE], ShapeError> {
    if rows.len() != SHAPE_GRID_SIZE {
        return Err(ShapeError::RowCount {
            expected: SHAPE_GRID_SIZE,
            actual: rows.len(),
        });
    }
    let mut cells = [[false; SHAPE_GRID_SIZE]; SHAPE_GRID_SIZE];
    for (y, row) in rows.iter().enumerate() {
        let row = row.trim();
        let len = row.chars().count();
        if len != SHAPE_GRID_SIZE {
            return Err(ShapeError::RowLength {
                row: y,
                expected: SHAPE_GRID_SIZE,
                actual: len,
            });
        }
        for (x, ch) in row.chars().enumerate() {
            cells[y][x] = match ch {
                '#' => true,
                '.' => false,
                ch => return Err(ShapeError::InvalidCell { row: y, ch }),
            };
        }
    }
    Ok(cells)
}

impl ShapeDefinition {
    /// Builds a shape from its grid, deriving tile count, bounds and masks.
    pub fn new(
        id: impl Into<ShapeId>,
        cells: [[bool; SHAPE_GRID_SIZE]; SHAPE_GRID_SIZE],
        spawn_weight: f64,
        difficulty_score: f64,
    ) -> Result<Self, ShapeError> {
        if !spawn_weight.is_finite() || spawn_weight < 0.0 {
            return Err(ShapeError::InvalidSpawnWeight(spawn_weight));
        }
        if !difficulty_score.is_finite() || difficulty_score < 0.0 {
            return Err(ShapeError::InvalidDifficulty(difficulty_score));
        }

        let active_cell_count = cells.iter().flatten().filter(|&&c| c).count();
        let bounds = compute_bounds(&cells);
        let row_masks = (0..bounds.height)
            .map(|dy| {
                (0..bounds.width)
                    .filter(|&dx| cells[bounds.min_y + dy][bounds.min_x + dx])
                    .fold(0_u64, |mask, dx| mask | (1 << dx))
            })
            .collect();

        Ok(Self {
            id: id.into(),
            cells,
            spawn_weight,
            difficulty_score,
            active_cell_count,
            bounds,
            row_masks,
        })
    }

    /// Builds a shape from ASCII rows, `'#'` for active and `'.'` for empty cells.
    ///
    /// Intended for tests and built-in catalogs; panics on malformed input.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn from_ascii(id: &str, rows: [&str; SHAPE_GRID_SIZE], spawn_weight: f64) -> Self {
        let cells = parse_grid(&rows).unwrap_or_else(|e| panic!("invalid shape {id:?}: {e}"));
        let difficulty = cells.iter().flatten().filter(|&&c| c).count() as f64;
        Self::new(id, cells, spawn_weight, difficulty)
            .unwrap_or_else(|e| panic!("invalid shape {id:?}: {e}"))
    }

    #[must_use]
    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    #[must_use]
    pub fn cells(&self) -> &[[bool; SHAPE_GRID_SIZE]; SHAPE_GRID_SIZE] {
        &self.cells
    }

    #[must_use]
    pub fn spawn_weight(&self) -> f64 {
        self.spawn_weight
    }

    #[must_use]
    pub fn difficulty_score(&self) -> f64 {
        self.difficulty_score
    }

    /// Number of active cells (tiles) of the shape.
    #[must_use]
    pub fn active_cell_count(&self) -> usize {
        self.active_cell_count
    }

    /// Whether the shape has no active cell at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_cell_count == 0
    }

    #[must_use]
    pub fn bounds(&self) -> ShapeBounds {
        self.bounds
    }

    /// Bit masks of the bounding-box rows, bit `dx` set for an active cell.
    #[must_use]
    pub fn row_masks(&self) -> &[u64] {
        &self.row_masks
    }

    /// Iterates over active cells relative to the bounding box's top-left corner.
    pub fn relative_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_masks.iter().enumerate().flat_map(|(dy, &mask)| {
            (0..self.bounds.width)
                .filter(move |&dx| mask & (1 << dx) != 0)
                .map(move |dx| (dx, dy))
        })
    }
}

fn compute_bounds(cells: &[[bool; SHAPE_GRID_SIZE]; SHAPE_GRID_SIZE]) -> ShapeBounds {
    let mut min_x = SHAPE_GRID_SIZE;
    let mut min_y = SHAPE_GRID_SIZE;
    let mut max_x = 0;
    let mut max_y = 0;
    for (y, row) in cells.iter().enumerate() {
        for (x, _) in row.iter().enumerate().filter(|(_, c)| **c) {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x {
        return ShapeBounds::DEGENERATE;
    }
    ShapeBounds {
        min_x,
        min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    }
}

impl fmt::Display for ShapeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (dy, &mask) in self.row_masks.iter().enumerate() {
            if dy > 0 {
                writeln!(f)?;
            }
            for dx in 0..self.bounds.width {
                let ch = if mask & (1 << dx) != 0 { '#' } else { '.' };
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}
