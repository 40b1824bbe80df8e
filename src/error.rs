use thiserror::Error;

use crate::types::{BlockId, Coordinate};

/// Errors reported by board, cell and slot operations.
///
/// Data-integrity and ownership errors fail the offending call only; state that
/// was already settled elsewhere on the board is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// The type registry has no entry for a block type named in stack data.
    #[error("block type `{0}` is not registered")]
    UnknownBlockType(String),

    /// Level data does not line up with the board dimensions.
    #[error("level holds {actual} cells but a {rows}x{columns} board needs {expected}")]
    CellCountMismatch {
        rows: i32,
        columns: i32,
        expected: usize,
        actual: usize,
    },

    /// A block was requested from a slot that does not own it.
    #[error("block {block} is not owned by this slot")]
    NotOwned { block: BlockId },

    #[error("cell {0} does not hold a slot")]
    NotASlot(Coordinate),

    #[error("coordinate {0} is outside the board")]
    OutOfRange(Coordinate),

    #[error("source and destination are the same cell {0}")]
    SameCell(Coordinate),
}

impl BoardError {
    /// True for errors caused by malformed level or stack data.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::UnknownBlockType(_) | Self::CellCountMismatch { .. }
        )
    }

    /// True when a caller lost track of which slot owns a block.
    pub fn is_ownership_violation(&self) -> bool {
        matches!(self, Self::NotOwned { .. })
    }
}
