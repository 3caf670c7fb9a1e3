use serde::{Deserialize, Serialize};

/// Set of column blocks selected by a scan. Block 0 is the dimension key,
/// block `k` is measure `k - 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBlocks(u64);

pub const PRIMARY_KEY_BLOCK: usize = 0;
pub const MAX_COLUMN_BLOCKS: usize = 64;

impl ColumnBlocks {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all(block_count: usize) -> Self {
        if block_count >= MAX_COLUMN_BLOCKS {
            Self(u64::MAX)
        } else {
            Self((1u64 << block_count) - 1)
        }
    }

    pub fn of(blocks: &[usize]) -> Self {
        blocks.iter().fold(Self::empty(), |acc, b| acc.with(*b))
    }

    pub fn with(self, block: usize) -> Self {
        debug_assert!(block < MAX_COLUMN_BLOCKS);
        Self(self.0 | (1u64 << block))
    }

    pub fn without(self, block: usize) -> Self {
        debug_assert!(block < MAX_COLUMN_BLOCKS);
        Self(self.0 & !(1u64 << block))
    }

    pub fn contains(&self, block: usize) -> bool {
        block < MAX_COLUMN_BLOCKS && self.0 & (1u64 << block) != 0
    }

    pub fn contains_measure(&self, measure: usize) -> bool {
        self.contains(measure + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_COLUMN_BLOCKS).filter(move |b| self.contains(*b))
    }
}
