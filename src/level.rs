use serde::{Deserialize, Serialize};

use crate::cell::{CellData, CellKind};
use crate::coordinate;
use crate::error::BoardError;

/// Authored board layout: dimensions plus one [`CellData`] per coordinate in
/// row-major order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub rows: i32,
    pub columns: i32,
    #[serde(default)]
    pub x_offset: f32,
    #[serde(default)]
    pub cells: Vec<CellData>,
}

impl LevelLayout {
    /// All-empty layout of the given size.
    pub fn empty(rows: i32, columns: i32) -> Self {
        Self {
            rows,
            columns,
            x_offset: 0.0,
            cells: vec![CellData::empty(); coordinate::area(rows, columns)],
        }
    }

    pub fn expected_cell_count(&self) -> usize {
        coordinate::area(self.rows, self.columns)
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        let expected = self.expected_cell_count();
        if self.cells.len() != expected {
            return Err(BoardError::CellCountMismatch {
                rows: self.rows,
                columns: self.columns,
                expected,
                actual: self.cells.len(),
            });
        }
        Ok(())
    }

    /// Total number of blocks the layout spawns.
    pub fn unit_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.kind == CellKind::Slot)
            .map(|cell| cell.stack.total_count())
            .sum()
    }

    /// CRC32 over the canonical contents. Payload that equality ignores does not
    /// affect the fingerprint.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.rows.to_le_bytes());
        hasher.update(&self.columns.to_le_bytes());
        hasher.update(&self.x_offset.to_le_bytes());
        for cell in &self.cells {
            let cell = cell.canonical();
            hasher.update(&[kind_tag(cell.kind), u8::from(cell.covered)]);
            hasher.update(&(cell.stack.sub_stacks.len() as u32).to_le_bytes());
            for run in &cell.stack.sub_stacks {
                let name = run.block_type.name().as_bytes();
                hasher.update(&(name.len() as u32).to_le_bytes());
                hasher.update(name);
                hasher.update(&run.count.to_le_bytes());
            }
        }
        hasher.finalize()
    }
}

fn kind_tag(kind: CellKind) -> u8 {
    match kind {
        CellKind::Empty => 0,
        CellKind::Slot => 1,
        CellKind::Obstacle => 2,
    }
}
