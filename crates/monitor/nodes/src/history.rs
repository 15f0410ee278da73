//! Contains the per-node [`ChainHistory`].

use crate::BlockInfo;
use std::collections::HashMap;

/// The last [`BlockInfo`] a node reported at each height it was asked about.
///
/// There is never more than one entry per height: a `put` replaces whatever was there.
/// Entries only go away through [`ChainHistory::invalidate`], which the reorg walk calls
/// for ancestors it has found to be stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainHistory {
    blocks: HashMap<u64, BlockInfo>,
}

impl ChainHistory {
    /// Creates an empty [`ChainHistory`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the block recorded at `number`.
    pub fn get(&self, number: u64) -> Option<BlockInfo> {
        self.blocks.get(&number).copied()
    }

    /// Records `block` at its own height, replacing any previous entry.
    pub fn put(&mut self, block: BlockInfo) {
        self.blocks.insert(block.number, block);
    }

    /// Removes the entry at `number`, returning it.
    pub fn invalidate(&mut self, number: u64) -> Option<BlockInfo> {
        self.blocks.remove(&number)
    }

    /// Returns `true` if a block is recorded at `number`.
    pub fn contains(&self, number: u64) -> bool {
        self.blocks.contains_key(&number)
    }

    /// Returns the number of recorded heights.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
