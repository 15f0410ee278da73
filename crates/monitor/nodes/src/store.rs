//! Hash-keyed persistence for every header the nodes fetch.

use crate::StoreError;
use alloy_primitives::B256;
use alloy_rpc_types_eth::Header;
use lru::LruCache;
use std::{fmt::Debug, num::NonZeroUsize, sync::Mutex};

/// The default number of headers retained by a [`MemoryHeaderStore`].
pub const DEFAULT_STORE_CAPACITY: usize = 10_000;

/// A store of raw headers keyed by block hash, shared by all nodes.
///
/// Writes for the same hash carry identical content, so implementations may treat a
/// repeated `add` as an idempotent overwrite without coordinating between writers.
pub trait HeaderStore: Debug + Send + Sync {
    /// Persists the header under the given hash.
    fn add(&self, hash: B256, header: &Header) -> Result<(), StoreError>;

    /// Looks up a header by hash.
    fn get(&self, hash: &B256) -> Result<Option<Header>, StoreError>;
}

/// An in-memory [`HeaderStore`] that forgets the least recently used headers once full.
#[derive(Debug)]
pub struct MemoryHeaderStore {
    headers: Mutex<LruCache<B256, Header>>,
}

impl MemoryHeaderStore {
    /// Creates a store retaining at most `capacity` headers. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { headers: Mutex::new(LruCache::new(capacity)) }
    }

    /// Returns the number of headers currently held.
    pub fn len(&self) -> usize {
        self.headers.lock().map(|headers| headers.len()).unwrap_or_default()
    }

    /// Returns `true` if the store holds no headers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryHeaderStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CAPACITY)
    }
}

impl HeaderStore for MemoryHeaderStore {
    fn add(&self, hash: B256, header: &Header) -> Result<(), StoreError> {
        let mut headers = self.headers.lock().map_err(|_| StoreError::Poisoned)?;
        headers.put(hash, header.clone());
        Ok(())
    }

    fn get(&self, hash: &B256) -> Result<Option<Header>, StoreError> {
        let mut headers = self.headers.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(headers.get(hash).cloned())
    }
}
