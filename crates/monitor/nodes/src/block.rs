//! Contains the [`BlockInfo`] snapshot of a fetched header.

use alloy_primitives::B256;
use alloy_rpc_types_eth::Header;
use core::fmt;
use serde::{Deserialize, Serialize};

/// The parts of a header a node reported for a given height.
///
/// Identity is the `(number, hash)` pair. A refetch after a reorg produces a new
/// [`BlockInfo`] rather than editing the old one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
}

impl BlockInfo {
    /// Creates a new [`BlockInfo`].
    pub const fn new(number: u64, hash: B256, parent_hash: B256) -> Self {
        Self { number, hash, parent_hash }
    }

    /// Returns the abbreviated hash, e.g. `aabbcc..ddeeff`.
    pub fn short_hash(&self) -> String {
        let bytes = self.hash.as_slice();
        format!(
            "{}..{}",
            alloy_primitives::hex::encode(&bytes[..3]),
            alloy_primitives::hex::encode(&bytes[29..])
        )
    }
}

impl From<&Header> for BlockInfo {
    fn from(header: &Header) -> Self {
        Self { number: header.number, hash: header.hash, parent_hash: header.parent_hash }
    }
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.number, self.short_hash())
    }
}
