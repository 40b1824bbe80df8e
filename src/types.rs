use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: i32,
    pub column: i32,
}

impl Coordinate {
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Identity of a spawned block. Unique per factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interned block type name. Cheap to clone, compares by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockType(Arc<str>);

impl BlockType {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Per-cell state returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellState {
    pub row: i32,
    pub column: i32,
    pub kind: String,
    pub covered: bool,
    /// Block type names from bottom to top.
    /// Contract: empty for every kind other than `slot`.
    pub blocks: Vec<String>,
    pub moving: bool,
}

/// Public board state returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardState {
    pub rows: i32,
    pub columns: i32,
    /// Row-major, `rows * columns` entries.
    pub cells: Vec<CellState>,
    pub unit_count: usize,
    pub is_settled: bool,
}

/// Outcome of one transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub moved: usize,
    pub source_remaining: usize,
    pub destination_count: usize,
}
