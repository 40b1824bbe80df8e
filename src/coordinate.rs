use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::Coordinate;

/// Maps coordinates to world positions on the XZ plane.
///
/// Cell (0, 0) sits on `origin`. Columns grow along +X and rows grow along -Z,
/// so a cell's position depends on its coordinate alone and survives resizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateLayout {
    pub cell_width: f32,
    pub cell_depth: f32,
    pub origin: Vec3,
}

impl Default for CoordinateLayout {
    fn default() -> Self {
        Self {
            cell_width: 1.0,
            cell_depth: 1.0,
            origin: Vec3::ZERO,
        }
    }
}

impl CoordinateLayout {
    pub fn to_position(&self, coordinate: Coordinate) -> Vec3 {
        let x = coordinate.column as f32 * self.cell_width;
        let z = -(coordinate.row as f32) * self.cell_depth;
        self.origin + Vec3::new(x, 0.0, z)
    }

    /// Nearest coordinate to a world position. The result may lie off the board.
    pub fn to_coordinate(&self, position: Vec3) -> Coordinate {
        let local = position - self.origin;
        let column = local.x / self.cell_width;
        let row = -local.z / self.cell_depth;
        Coordinate::new(row.round() as i32, column.round() as i32)
    }
}

/// Row-major index of a coordinate, or `None` when it lies outside a
/// `rows` x `columns` grid.
pub fn coordinate_to_index(coordinate: Coordinate, rows: i32, columns: i32) -> Option<usize> {
    if !in_bounds(coordinate, rows, columns) {
        return None;
    }
    Some(coordinate.row as usize * columns as usize + coordinate.column as usize)
}

/// Coordinate of a row-major index, or `None` when the index lies outside a
/// `rows` x `columns` grid.
pub fn index_to_coordinate(index: usize, rows: i32, columns: i32) -> Option<Coordinate> {
    if index >= area(rows, columns) {
        return None;
    }
    let columns = columns as usize;
    let row = i32::try_from(index / columns).ok()?;
    let column = i32::try_from(index % columns).ok()?;
    Some(Coordinate::new(row, column))
}

/// Cell count of a `rows` x `columns` grid; negative sides count as zero.
pub fn area(rows: i32, columns: i32) -> usize {
    (rows.max(0) as usize).saturating_mul(columns.max(0) as usize)
}

pub fn in_bounds(coordinate: Coordinate, rows: i32, columns: i32) -> bool {
    (0..rows).contains(&coordinate.row) && (0..columns).contains(&coordinate.column)
}
