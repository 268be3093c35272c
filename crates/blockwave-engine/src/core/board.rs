use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::BoardError;

use super::{placement::PlacementFit, shape::ShapeDefinition};

/// Maximum supported board width (one `u64` bit row per board row).
pub const MAX_BOARD_WIDTH: usize = 64;

/// Read-only view of the live board owned by the caller.
///
/// The engine never writes through this trait. Each generation call takes a
/// private [`BoardOccupancy`] snapshot of the view and simulates on that copy.
pub trait BoardQuery {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    fn is_occupied(&self, x: usize, y: usize) -> bool;

    /// Iterates over occupied cells as `(x, y)`, row by row.
    fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows()).flat_map(move |y| {
            (0..self.cols())
                .filter(move |&x| self.is_occupied(x, y))
                .map(move |x| (x, y))
        })
    }
}

/// Direction of a board line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Row,
    Column,
}

/// Number of lines removed by [`BoardOccupancy::resolve_lines`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearedLines {
    pub rows: usize,
    pub cols: usize,
}

impl ClearedLines {
    #[must_use]
    pub fn total(self) -> usize {
        self.rows + self.cols
    }
}

/// Occupancy grid stored as one bit row per board row.
///
/// Bit `x` of `rows[y]` is set when the cell at column `x`, row `y` is
/// occupied. Bits at or above `cols` are always clear.
///
/// This is the engine's *virtual* board: a snapshot taken from a
/// [`BoardQuery`] with [`Self::from_query`], owned exclusively by one
/// generation call. Shape collision tests shift the shape's row masks to the
/// placement column and test them against the board rows, one row at a time.
///
/// # Example
///
/// ```
/// use blockwave_engine::BoardOccupancy;
///
/// let board: BoardOccupancy = "
///     ####.
///     ....
///     #..#
/// "
/// .parse()
/// .unwrap();
/// assert_eq!(board.rows(), 3);
/// assert_eq!(board.cols(), 4);
/// assert_eq!(board.vacancy(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardOccupancy {
    cols: usize,
    rows: Vec<u64>,
}

impl BoardOccupancy {
    /// Creates an empty board.
    pub fn new(rows: usize, cols: usize) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::EmptyBoard { rows, cols });
        }
        if cols > MAX_BOARD_WIDTH {
            return Err(BoardError::TooWide {
                cols,
                max: MAX_BOARD_WIDTH,
            });
        }
        Ok(Self {
            cols,
            rows: vec![0; rows],
        })
    }

    /// Copies a read-only board view into a fresh occupancy grid.
    pub fn from_query<B>(board: &B) -> Result<Self, BoardError>
    where
        B: BoardQuery,
    {
        let mut this = Self::new(board.rows(), board.cols())?;
        for (x, y) in board.occupied_cells() {
            this.occupy(x, y);
        }
        Ok(this)
    }

    /// Creates a board from ASCII art for testing.
    ///
    /// `'#'` is an occupied cell, `'.'` an empty one. Blank lines and
    /// surrounding whitespace are ignored. Panics on malformed input.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        art.parse()
            .unwrap_or_else(|e| panic!("invalid board art: {e}"))
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn full_row_mask(&self) -> u64 {
        if self.cols == MAX_BOARD_WIDTH {
            u64::MAX
        } else {
            (1 << self.cols) - 1
        }
    }

    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.rows[y] & (1 << x) != 0
    }

    pub fn occupy(&mut self, x: usize, y: usize) {
        self.rows[y] |= 1 << x;
    }

    /// Number of unoccupied cells.
    #[must_use]
    pub fn vacancy(&self) -> usize {
        let occupied = self
            .rows
            .iter()
            .map(|row| row.count_ones() as usize)
            .sum::<usize>();
        self.rows.len() * self.cols - occupied
    }

    /// Number of cells in the board.
    #[must_use]
    pub fn area(&self) -> usize {
        self.rows.len() * self.cols
    }

    /// Length of a line along the given axis.
    #[must_use]
    pub fn line_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.cols,
            Axis::Column => self.rows.len(),
        }
    }

    /// Number of lines along the given axis.
    #[must_use]
    pub fn line_count(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.rows.len(),
            Axis::Column => self.cols,
        }
    }

    /// Occupancy of the cell at position `pos` of the given line.
    #[must_use]
    pub fn is_line_cell_occupied(&self, axis: Axis, index: usize, pos: usize) -> bool {
        match axis {
            Axis::Row => self.is_occupied(pos, index),
            Axis::Column => self.is_occupied(index, pos),
        }
    }

    /// Whether the shape's bounding box can be placed at `(x, y)` at all.
    #[must_use]
    pub fn is_in_bounds(&self, shape: &ShapeDefinition, x: usize, y: usize) -> bool {
        let bounds = shape.bounds();
        x + bounds.width <= self.cols && y + bounds.height <= self.rows.len()
    }

    /// Checks if any active cell of the shape placed at `(x, y)` overlaps an
    /// occupied cell. The placement must be in bounds.
    #[must_use]
    pub fn is_colliding(&self, shape: &ShapeDefinition, x: usize, y: usize) -> bool {
        shape
            .row_masks()
            .iter()
            .zip(&self.rows[y..])
            .any(|(&mask, &row)| row & (mask << x) != 0)
    }

    /// Whether the shape fits at `(x, y)`: in bounds and without collision.
    #[must_use]
    pub fn fits(&self, shape: &ShapeDefinition, x: usize, y: usize) -> bool {
        !shape.is_empty() && self.is_in_bounds(shape, x, y) && !self.is_colliding(shape, x, y)
    }

    /// Marks every cell covered by the fit as occupied.
    pub fn place(&mut self, fit: &PlacementFit) {
        for &(x, y) in fit.covered() {
            self.occupy(x, y);
        }
    }

    /// Clears every full row and every full column simultaneously.
    ///
    /// Cells are removed in place, nothing shifts.
    pub fn resolve_lines(&mut self) -> ClearedLines {
        let full = self.full_row_mask();
        let full_rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| **row == full)
            .map(|(y, _)| y)
            .collect::<Vec<_>>();
        let full_cols = self.rows.iter().fold(full, |acc, row| acc & row);

        for &y in &full_rows {
            self.rows[y] = 0;
        }
        for row in &mut self.rows {
            *row &= !full_cols;
        }

        ClearedLines {
            rows: full_rows.len(),
            cols: full_cols.count_ones() as usize,
        }
    }
}

impl BoardQuery for BoardOccupancy {
    fn rows(&self) -> usize {
        self.rows.len()
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn is_occupied(&self, x: usize, y: usize) -> bool {
        BoardOccupancy::is_occupied(self, x, y)
    }
}

impl FromStr for BoardOccupancy {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>();
        let cols = lines.first().map_or(0, |line| line.chars().count());
        let mut board = Self::new(lines.len(), cols)?;

        for (y, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            if len != cols {
                return Err(BoardError::RaggedRow {
                    row: y,
                    expected: cols,
                    actual: len,
                });
            }
            for (x, ch) in line.chars().enumerate() {
                match ch {
                    '#' => board.occupy(x, y),
                    '.' => {}
                    ch => return Err(BoardError::InvalidCell { row: y, ch }),
                }
            }
        }
        Ok(board)
    }
}

impl fmt::Display for BoardOccupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.rows.len() {
            if y > 0 {
                writeln!(f)?;
            }
            for x in 0..self.cols {
                let ch = if self.is_occupied(x, y) { '#' } else { '.' };
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}
