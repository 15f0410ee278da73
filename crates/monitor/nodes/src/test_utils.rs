//! A scripted in-memory chain for exercising nodes without a real endpoint.

use crate::{HeaderClient, NodeMetrics, RateLimiter, RpcNode};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{B256, keccak256};
use alloy_rpc_types_eth::Header;
use alloy_transport::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio_util::sync::CancellationToken;

/// A canonical chain served over the [`HeaderClient`] interface.
///
/// Clones share state, so a test can keep a handle to reorganise the chain or take the
/// endpoint offline after handing a clone to a node.
#[derive(Debug, Clone, Default)]
pub struct TestChain {
    state: Arc<Mutex<ChainState>>,
}

#[derive(Debug, Default)]
struct ChainState {
    headers: BTreeMap<u64, Header>,
    forks: u64,
    offline: bool,
    failing: HashSet<u64>,
    dropped: HashSet<u64>,
    version: String,
    header_calls: usize,
    version_calls: usize,
}

impl TestChain {
    /// Creates a chain with blocks `0..=head`.
    pub fn with_head(head: u64) -> Self {
        let chain = Self::default();
        chain.state().version = "TestClient/v1.0.0".to_string();
        chain.extend(head + 1);
        chain
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `count` blocks on top of the current head.
    pub fn extend(&self, count: u64) {
        let mut state = self.state();
        for _ in 0..count {
            let number = state.headers.last_key_value().map_or(0, |(n, _)| n + 1);
            let parent_hash = number
                .checked_sub(1)
                .and_then(|parent| state.headers.get(&parent))
                .map_or(B256::ZERO, |parent| parent.hash);
            let header = make_header(number, state.forks, parent_hash);
            state.headers.insert(number, header);
        }
    }

    /// Replaces the top `depth` blocks with a competing branch of the same length.
    pub fn reorg(&self, depth: u64) {
        let head = self.head();
        let mut state = self.state();
        state.forks += 1;
        let forks = state.forks;
        for number in (head + 1).saturating_sub(depth)..=head {
            let parent_hash = number
                .checked_sub(1)
                .and_then(|parent| state.headers.get(&parent))
                .map_or(B256::ZERO, |parent| parent.hash);
            state.headers.insert(number, make_header(number, forks, parent_hash));
        }
    }

    /// Returns the current head number.
    pub fn head(&self) -> u64 {
        self.state().headers.last_key_value().map_or(0, |(n, _)| *n)
    }

    /// Returns the canonical hash at `number`.
    pub fn hash_at(&self, number: u64) -> Option<B256> {
        self.state().headers.get(&number).map(|header| header.hash)
    }

    /// Makes every call fail with a transport error while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Makes header requests for `number` fail with a transport error.
    pub fn fail_at(&self, number: u64) {
        self.state().failing.insert(number);
    }

    /// Makes header requests for `number` succeed without a header.
    pub fn drop_at(&self, number: u64) {
        self.state().dropped.insert(number);
    }

    /// Clears any failures set by [`Self::fail_at`] and [`Self::drop_at`].
    pub fn heal(&self) {
        let mut state = self.state();
        state.failing.clear();
        state.dropped.clear();
    }

    /// Sets the version string reported by `web3_clientVersion`.
    pub fn set_version(&self, version: impl Into<String>) {
        self.state().version = version.into();
    }

    /// Returns the number of header requests served so far.
    pub fn header_calls(&self) -> usize {
        self.state().header_calls
    }

    /// Returns the number of version requests served so far.
    pub fn version_calls(&self) -> usize {
        self.state().version_calls
    }

    /// Builds an unlimited, metric-less node backed by this chain.
    pub fn node(&self, name: &str) -> RpcNode<Self> {
        RpcNode::new(
            name,
            "n/a",
            self.clone(),
            RateLimiter::unlimited(),
            None,
            NodeMetrics::noop(),
            CancellationToken::new(),
        )
    }
}

fn make_header(number: u64, fork: u64, parent_hash: B256) -> Header {
    let mut seed = [0u8; 16];
    seed[..8].copy_from_slice(&number.to_be_bytes());
    seed[8..].copy_from_slice(&fork.to_be_bytes());
    Header {
        hash: keccak256(seed),
        inner: alloy_consensus::Header { number, parent_hash, ..Default::default() },
        ..Default::default()
    }
}

#[async_trait]
impl HeaderClient for TestChain {
    async fn header_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> Result<Option<Header>, TransportError> {
        let mut state = self.state();
        state.header_calls += 1;
        if state.offline {
            return Err(TransportErrorKind::custom_str("endpoint offline"));
        }

        let number = match block {
            BlockNumberOrTag::Number(number) => number,
            _ => state.headers.last_key_value().map_or(0, |(n, _)| *n),
        };
        if state.failing.contains(&number) {
            return Err(TransportErrorKind::custom_str("internal error"));
        }
        if state.dropped.contains(&number) {
            return Ok(None);
        }
        Ok(state.headers.get(&number).cloned())
    }

    async fn client_version(&self) -> Result<String, TransportError> {
        let mut state = self.state();
        state.version_calls += 1;
        if state.offline {
            return Err(TransportErrorKind::custom_str("endpoint offline"));
        }
        Ok(state.version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_links_parents() {
        let chain = TestChain::with_head(5);
        assert_eq!(chain.head(), 5);

        let state = chain.state();
        for number in 1..=5 {
            assert_eq!(state.headers[&number].parent_hash, state.headers[&(number - 1)].hash);
        }
    }

    #[test]
    fn test_reorg_keeps_common_ancestor() {
        let chain = TestChain::with_head(10);
        let before = (0..=10).map(|n| chain.hash_at(n).unwrap()).collect::<Vec<_>>();

        chain.reorg(3);

        for number in 0..=7 {
            assert_eq!(chain.hash_at(number).unwrap(), before[number as usize]);
        }
        for number in 8..=10 {
            assert_ne!(chain.hash_at(number).unwrap(), before[number as usize]);
        }
        let state = chain.state();
        assert_eq!(state.headers[&8].parent_hash, state.headers[&7].hash);
    }
}
