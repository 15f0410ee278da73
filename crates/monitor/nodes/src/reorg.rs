//! Contains the [`ReorgTracker`], which keeps a node's [`ChainHistory`] consistent with the
//! parent hashes of the headers it fetches.

use crate::{BlockInfo, ChainHistory, FetchError, HeaderClient, HeaderFetcher, ReorgWalkAborted};
use alloy_eips::BlockNumberOrTag;

/// The result of [`ReorgTracker::fetch_with_reorg_check`].
#[derive(Debug)]
pub struct ReorgOutcome {
    /// The block at the requested height.
    pub block: BlockInfo,
    /// The number of cached ancestors found to be stale.
    pub depth: u64,
    /// Set if the ancestry walk stopped before reaching a confirmed ancestor.
    pub aborted: Option<ReorgWalkAborted>,
}

/// Fetches headers and walks cached ancestry to detect reorgs.
///
/// After fetching the requested header, the tracker compares its parent hash with the
/// cached block one height below. On a mismatch that cached block is stale: it is dropped,
/// re-fetched, and the comparison repeats one height further down, until a cached ancestor
/// matches or there is nothing cached below. Each mismatch adds one to the reorg depth.
///
/// History changes are staged while walking and applied in one go at the end, so a call
/// that is dropped or cancelled midway leaves the history as it was.
#[derive(Debug)]
pub struct ReorgTracker<C> {
    fetcher: HeaderFetcher<C>,
    history: ChainHistory,
}

impl<C: HeaderClient> ReorgTracker<C> {
    /// Creates a new [`ReorgTracker`] with an empty history.
    pub fn new(fetcher: HeaderFetcher<C>) -> Self {
        Self { fetcher, history: ChainHistory::new() }
    }

    /// Returns the history of blocks seen by this tracker.
    pub const fn history(&self) -> &ChainHistory {
        &self.history
    }

    /// Returns the underlying fetcher.
    pub const fn fetcher(&self) -> &HeaderFetcher<C> {
        &self.fetcher
    }

    /// Fetches the header at `block`, reconciles the cached ancestry with it, and records it.
    ///
    /// Fails only if the requested header itself cannot be fetched, or if the walk is
    /// cancelled. A failed ancestor re-fetch ends the walk early and is reported through
    /// [`ReorgOutcome::aborted`].
    pub async fn fetch_with_reorg_check(
        &mut self,
        block: BlockNumberOrTag,
    ) -> Result<ReorgOutcome, FetchError> {
        let requested = self.fetcher.fetch_header(block).await?;

        let mut fetched = vec![requested];
        let mut stale = Vec::new();
        let mut depth = 0;
        let mut aborted = None;

        let mut current = requested;
        let mut parent = self.cached_parent(requested.number);
        while let Some(parent_info) = parent {
            if parent_info.hash == current.parent_hash {
                break;
            }

            depth += 1;
            stale.push(parent_info.number);
            trace!(
                target: "headwatch::reorg",
                node = %self.fetcher.name(),
                number = parent_info.number,
                cached = %parent_info.hash,
                expected = %current.parent_hash,
                "Cached ancestor is stale, refetching"
            );

            match self.fetcher.fetch_header(BlockNumberOrTag::Number(parent_info.number)).await {
                Ok(refetched) => {
                    fetched.push(refetched);
                    current = refetched;
                    parent = self.cached_parent(parent_info.number);
                }
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(source) => {
                    let err = ReorgWalkAborted { number: parent_info.number, source };
                    warn!(target: "headwatch::reorg", node = %self.fetcher.name(), %err, "Reorg walk aborted");
                    aborted = Some(err);
                    break;
                }
            }
        }

        for number in stale {
            self.history.invalidate(number);
        }
        // Ancestors first so the requested block is never shadowed by a refetch at its height.
        for info in fetched.into_iter().rev() {
            self.history.put(info);
        }

        if depth > 1 {
            info!(
                target: "headwatch::reorg",
                node = %self.fetcher.name(),
                number = requested.number,
                depth,
                "Node reorged"
            );
        } else if depth == 1 {
            debug!(
                target: "headwatch::reorg",
                node = %self.fetcher.name(),
                number = requested.number,
                "Replaced stale parent"
            );
        }

        Ok(ReorgOutcome { block: requested, depth, aborted })
    }

    fn cached_parent(&self, number: u64) -> Option<BlockInfo> {
        number.checked_sub(1).and_then(|parent| self.history.get(parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RateLimiter, test_utils::TestChain};
    use alloy_rpc_types_eth::Header;
    use alloy_transport::TransportError;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    /// Serves a [`TestChain`] but cancels the token and hangs on the `cancel_at`-th header
    /// request.
    #[derive(Debug)]
    struct CancellingChain {
        chain: TestChain,
        cancellation: CancellationToken,
        cancel_at: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HeaderClient for CancellingChain {
        async fn header_by_number(
            &self,
            block: BlockNumberOrTag,
        ) -> Result<Option<Header>, TransportError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.cancel_at {
                self.cancellation.cancel();
                std::future::pending::<()>().await;
            }
            self.chain.header_by_number(block).await
        }

        async fn client_version(&self) -> Result<String, TransportError> {
            self.chain.client_version().await
        }
    }

    fn tracker(chain: &TestChain) -> ReorgTracker<TestChain> {
        ReorgTracker::new(HeaderFetcher::new(
            "test",
            chain.clone(),
            RateLimiter::unlimited(),
            None,
            CancellationToken::new(),
        ))
    }

    #[tokio::test]
    async fn test_consistent_chain_has_no_reorgs() {
        let chain = TestChain::with_head(20);
        let mut tracker = tracker(&chain);

        for number in 10..=20 {
            let outcome =
                tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(number)).await.unwrap();
            assert_eq!(outcome.depth, 0);
            assert!(outcome.aborted.is_none());
        }

        assert_eq!(tracker.history().len(), 11);
        assert_eq!(chain.header_calls(), 11);
    }

    #[tokio::test]
    async fn test_latest_without_parent_in_cache() {
        let chain = TestChain::with_head(5);
        let mut tracker = tracker(&chain);

        let outcome = tracker.fetch_with_reorg_check(BlockNumberOrTag::Latest).await.unwrap();
        assert_eq!(outcome.block.number, 5);
        assert_eq!(outcome.depth, 0);
        assert_eq!(tracker.history().get(5), Some(outcome.block));
    }

    #[tokio::test]
    async fn test_genesis_has_no_parent() {
        let chain = TestChain::with_head(0);
        let mut tracker = tracker(&chain);

        let outcome =
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(0)).await.unwrap();
        assert_eq!(outcome.block.number, 0);
        assert_eq!(outcome.depth, 0);
    }

    #[rstest]
    #[case::single_block(1)]
    #[case::two_blocks(2)]
    #[case::deep(5)]
    #[tokio::test]
    async fn test_reorg_replaces_stale_ancestors(#[case] reorg_depth: u64) {
        let chain = TestChain::with_head(100);
        let mut tracker = tracker(&chain);
        for number in 90..=100 {
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(number)).await.unwrap();
        }

        // A competing branch replaces the top blocks and then advances by one.
        chain.reorg(reorg_depth);
        chain.extend(1);
        let calls_before = chain.header_calls();

        let outcome = tracker.fetch_with_reorg_check(BlockNumberOrTag::Latest).await.unwrap();

        assert_eq!(outcome.block.number, 101);
        assert_eq!(outcome.depth, reorg_depth);
        assert!(outcome.aborted.is_none());
        // One fetch for the head plus one per stale ancestor.
        assert_eq!(chain.header_calls() - calls_before, 1 + reorg_depth as usize);
        for number in 90..=101 {
            assert_eq!(tracker.history().get(number).unwrap().hash, chain.hash_at(number).unwrap());
        }
    }

    #[tokio::test]
    async fn test_refetch_at_same_height_walks_to_new_parent() {
        let chain = TestChain::with_head(50);
        let mut tracker = tracker(&chain);
        for number in 48..=50 {
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(number)).await.unwrap();
        }
        let old_parent = tracker.history().get(49).unwrap();

        // Height 50 is reported again, now on top of a different 49.
        chain.reorg(2);
        let outcome =
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(50)).await.unwrap();

        assert!(outcome.depth >= 1);
        let new_parent = tracker.history().get(49).unwrap();
        assert_ne!(new_parent.hash, old_parent.hash);
        assert_eq!(new_parent.hash, outcome.block.parent_hash);
        assert_eq!(tracker.history().get(48).unwrap().hash, new_parent.parent_hash);
    }

    #[tokio::test]
    async fn test_walk_stops_at_history_gap() {
        let chain = TestChain::with_head(30);
        let mut tracker = tracker(&chain);
        // Heights 25 and 29 are cached, but nothing between them.
        tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(25)).await.unwrap();
        tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(29)).await.unwrap();

        chain.reorg(10);
        let outcome =
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(30)).await.unwrap();

        // Only 29 is known to be stale; 28 is not cached so the walk ends there.
        assert_eq!(outcome.depth, 1);
        assert_eq!(tracker.history().get(29).unwrap().hash, chain.hash_at(29).unwrap());
        assert_ne!(tracker.history().get(25).unwrap().hash, chain.hash_at(25).unwrap());
    }

    #[tokio::test]
    async fn test_failed_refetch_aborts_walk() {
        let chain = TestChain::with_head(40);
        let mut tracker = tracker(&chain);
        for number in 36..=40 {
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(number)).await.unwrap();
        }

        chain.reorg(3);
        chain.extend(1);
        chain.fail_at(39);

        let outcome = tracker.fetch_with_reorg_check(BlockNumberOrTag::Latest).await.unwrap();

        assert_eq!(outcome.block.number, 41);
        let aborted = outcome.aborted.expect("walk should abort");
        assert_eq!(aborted.number, 39);
        assert!(matches!(aborted.source, FetchError::Transport(_)));
        // 40 was replaced, 39 was invalidated but could not be refetched.
        assert_eq!(tracker.history().get(40).unwrap().hash, chain.hash_at(40).unwrap());
        assert!(!tracker.history().contains(39));
        assert!(tracker.history().contains(38));
        assert_eq!(tracker.history().get(41), Some(outcome.block));
    }

    #[tokio::test]
    async fn test_failed_requested_fetch_leaves_history() {
        let chain = TestChain::with_head(10);
        let mut tracker = tracker(&chain);
        tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(9)).await.unwrap();
        let before = tracker.history().clone();

        chain.drop_at(10);
        let err =
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(10)).await.unwrap_err();

        assert!(matches!(err, FetchError::EmptyResponse { .. }));
        assert_eq!(tracker.history(), &before);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_leaves_history() {
        let chain = TestChain::with_head(10);
        let cancellation = CancellationToken::new();
        let mut tracker = ReorgTracker::new(HeaderFetcher::new(
            "test",
            chain.clone(),
            RateLimiter::unlimited(),
            None,
            cancellation.clone(),
        ));
        for number in 8..=10 {
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(number)).await.unwrap();
        }
        let before = tracker.history().clone();

        cancellation.cancel();
        chain.reorg(2);
        let err = tracker.fetch_with_reorg_check(BlockNumberOrTag::Latest).await.unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
        assert_eq!(tracker.history(), &before);
    }

    #[tokio::test]
    async fn test_cancelled_walk_leaves_history() {
        let chain = TestChain::with_head(10);
        let cancellation = CancellationToken::new();
        let client = CancellingChain {
            chain: chain.clone(),
            cancellation: cancellation.clone(),
            // Three warm-up fetches, the new tip, then the first ancestor refetch.
            cancel_at: 5,
            calls: AtomicUsize::new(0),
        };
        let mut tracker = ReorgTracker::new(HeaderFetcher::new(
            "test",
            client,
            RateLimiter::unlimited(),
            None,
            cancellation.clone(),
        ));
        for number in 8..=10 {
            tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(number)).await.unwrap();
        }
        let before = tracker.history().clone();

        chain.reorg(2);
        chain.extend(1);
        let err = tracker.fetch_with_reorg_check(BlockNumberOrTag::Latest).await.unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
        assert!(cancellation.is_cancelled());
        assert_eq!(chain.header_calls(), 4);
        assert_eq!(tracker.history(), &before);
        assert!(!tracker.history().contains(11));
    }
}
