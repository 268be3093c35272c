use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::CatalogError;

use super::shape::{SHAPE_GRID_SIZE, ShapeDefinition, ShapeId, ShapeRecord};

/// The ordered, immutable set of shapes the generator picks from.
///
/// A catalog is loaded once and never mutated afterwards; reloading means
/// building a new catalog and handing it to
/// [`WaveGenerator::reload_catalog`](crate::WaveGenerator::reload_catalog).
/// Shape identifiers are unique within a catalog, and catalog order is the
/// tie-breaking order wherever the generator needs one.
///
/// Shapes without active cells are accepted but never offered: they are
/// excluded by [`Self::usable_indices`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<ShapeRecord>", into = "Vec<ShapeRecord>")]
pub struct ShapeCatalog {
    shapes: Vec<ShapeDefinition>,
    usable: Vec<usize>,
}

impl TryFrom<Vec<ShapeRecord>> for ShapeCatalog {
    type Error = CatalogError;

    fn try_from(records: Vec<ShapeRecord>) -> Result<Self, Self::Error> {
        let shapes = records
            .into_iter()
            .map(|record| {
                let id = record.id.to_string();
                ShapeDefinition::try_from(record)
                    .map_err(|source| CatalogError::InvalidShape { id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shapes)
    }
}

impl From<ShapeCatalog> for Vec<ShapeRecord> {
    fn from(catalog: ShapeCatalog) -> Self {
        catalog.shapes.into_iter().map(ShapeRecord::from).collect()
    }
}

/// Built-in shapes: `(id, rows, spawn weight)`.
const STANDARD_SHAPES: &[(&str, [&str; SHAPE_GRID_SIZE], f64)] = &[
    ("mono", ["#....", ".....", ".....", ".....", "....."], 1.0),
    ("I2h", ["##...", ".....", ".....", ".....", "....."], 2.0),
    ("I2v", ["#....", "#....", ".....", ".....", "....."], 2.0),
    ("I3h", ["###..", ".....", ".....", ".....", "....."], 2.0),
    ("I3v", ["#....", "#....", "#....", ".....", "....."], 2.0),
    ("V3a", ["##...", "#....", ".....", ".....", "....."], 1.5),
    ("V3b", ["##...", ".#...", ".....", ".....", "....."], 1.5),
    ("V3c", [".#...", "##...", ".....", ".....", "....."], 1.5),
    ("V3d", ["#....", "##...", ".....", ".....", "....."], 1.5),
    ("I4h", ["####.", ".....", ".....", ".....", "....."], 2.0),
    ("I4v", ["#....", "#....", "#....", "#....", "....."], 2.0),
    ("O4", ["##...", "##...", ".....", ".....", "....."], 3.0),
    ("T4u", ["###..", ".#...", ".....", ".....", "....."], 1.0),
    ("T4d", [".#...", "###..", ".....", ".....", "....."], 1.0),
    ("T4l", ["#....", "##...", "#....", ".....", "....."], 1.0),
    ("T4r", [".#...", "##...", ".#...", ".....", "....."], 1.0),
    ("L4a", ["#....", "#....", "##...", ".....", "....."], 1.0),
    ("L4b", ["###..", "#....", ".....", ".....", "....."], 1.0),
    ("L4c", ["##...", ".#...", ".#...", ".....", "....."], 1.0),
    ("L4d", ["..#..", "###..", ".....", ".....", "....."], 1.0),
    ("J4a", [".#...", ".#...", "##...", ".....", "....."], 1.0),
    ("J4b", ["#....", "###..", ".....", ".....", "....."], 1.0),
    ("J4c", ["##...", "#....", "#....", ".....", "....."], 1.0),
    ("J4d", ["###..", "..#..", ".....", ".....", "....."], 1.0),
    ("S4h", [".##..", "##...", ".....", ".....", "....."], 0.8),
    ("S4v", ["#....", "##...", ".#...", ".....", "....."], 0.8),
    ("Z4h", ["##...", ".##..", ".....", ".....", "....."], 0.8),
    ("Z4v", [".#...", "##...", "#....", ".....", "....."], 0.8),
    ("I5h", ["#####", ".....", ".....", ".....", "....."], 1.0),
    ("I5v", ["#....", "#....", "#....", "#....", "#...."], 1.0),
    ("O9", ["###..", "###..", "###..", ".....", "....."], 1.5),
    ("V5a", ["###..", "#....", "#....", ".....", "....."], 0.7),
    ("V5b", ["###..", "..#..", "..#..", ".....", "....."], 0.7),
    ("V5c", ["..#..", "..#..", "###..", ".....", "....."], 0.7),
    ("V5d", ["#....", "#....", "###..", ".....", "....."], 0.7),
];

impl ShapeCatalog {
    /// Builds a catalog from an ordered list of shapes.
    ///
    /// Fails if the list is empty, if two shapes share an identifier, or if no
    /// shape has an active cell.
    pub fn new(shapes: Vec<ShapeDefinition>) -> Result<Self, CatalogError> {
        if shapes.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(shapes.len());
        for shape in &shapes {
            if !seen.insert(shape.id()) {
                return Err(CatalogError::DuplicateId(shape.id().to_string()));
            }
        }
        let usable = shapes
            .iter()
            .enumerate()
            .filter(|(_, shape)| {
                if shape.is_empty() {
                    tracing::warn!(shape = %shape.id(), "skipping shape without active cells");
                }
                !shape.is_empty()
            })
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if usable.is_empty() {
            return Err(CatalogError::NoUsableShape);
        }
        Ok(Self { shapes, usable })
    }

    /// The built-in catalog of classic block-puzzle shapes (1 to 9 tiles).
    #[must_use]
    pub fn standard() -> Self {
        let shapes = STANDARD_SHAPES
            .iter()
            .map(|(id, rows, weight)| ShapeDefinition::from_ascii(id, *rows, *weight))
            .collect();
        Self::new(shapes).expect("standard shapes should form a valid catalog")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Always `false`: construction rejects empty catalogs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &ShapeDefinition {
        &self.shapes[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeDefinition> + '_ {
        self.shapes.iter()
    }

    /// Position of the shape with the given identifier, if any.
    #[must_use]
    pub fn index_of(&self, id: &ShapeId) -> Option<usize> {
        self.shapes.iter().position(|shape| shape.id() == id)
    }

    /// Indices of shapes that have at least one active cell, in catalog order.
    #[must_use]
    pub fn usable_indices(&self) -> &[usize] {
        &self.usable
    }
}
