//! Run-length encoding of block stacks.
//!
//! A stack is stored bottom-to-top as `(type, count)` runs. [`encode`] always
//! produces the maximal encoding: no two adjacent runs share a type and no run
//! has a zero count. [`decode`] expands runs back into one entry per unit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::BlockType;

/// A run of consecutive same-typed units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubStack {
    pub block_type: BlockType,
    pub count: u32,
}

impl SubStack {
    pub fn new(block_type: impl Into<BlockType>, count: u32) -> Self {
        Self {
            block_type: block_type.into(),
            count,
        }
    }
}

/// Serialized form of a stack.
///
/// Equality is element-wise over the runs as stored. Two values that expand to
/// the same units are not equal unless both are normalized first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackData {
    #[serde(default)]
    pub sub_stacks: Vec<SubStack>,
}

impl StackData {
    pub fn new(sub_stacks: Vec<SubStack>) -> Self {
        Self { sub_stacks }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Number of units the data expands to.
    pub fn total_count(&self) -> usize {
        self.sub_stacks.iter().map(|run| run.count as usize).sum()
    }

    /// Element-wise comparison of the stored runs.
    pub fn compare(&self, other: &StackData) -> bool {
        self == other
    }

    /// Re-encodes the expansion, merging adjacent equal runs and pruning empty ones.
    pub fn normalized(&self) -> StackData {
        encode(decode(self).iter())
    }

    pub fn is_normalized(&self) -> bool {
        self.sub_stacks.iter().all(|run| run.count > 0)
            && self
                .sub_stacks
                .windows(2)
                .all(|pair| pair[0].block_type != pair[1].block_type)
    }
}

impl fmt::Display for StackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, run) in self.sub_stacks.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{} {}", run.block_type, run.count)?;
        }
        Ok(())
    }
}

/// Groups consecutive equal types into runs.
pub fn encode<'a, I>(units: I) -> StackData
where
    I: IntoIterator<Item = &'a BlockType>,
{
    let mut sub_stacks: Vec<SubStack> = Vec::new();
    for block_type in units {
        match sub_stacks.last_mut() {
            Some(run) if run.block_type == *block_type => run.count += 1,
            _ => sub_stacks.push(SubStack {
                block_type: block_type.clone(),
                count: 1,
            }),
        }
    }
    StackData { sub_stacks }
}

/// Expands every run into `count` units, bottom to top.
pub fn decode(data: &StackData) -> Vec<BlockType> {
    let mut units = Vec::with_capacity(data.total_count());
    for run in &data.sub_stacks {
        units.extend(std::iter::repeat_n(run.block_type.clone(), run.count as usize));
    }
    units
}
