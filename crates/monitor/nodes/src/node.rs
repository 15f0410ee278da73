//! Contains the [`ChainNode`] trait and its RPC backed implementation, [`RpcNode`].

use crate::{
    BlockInfo, ChainHistory, FetchError, HeaderClient, HeaderFetcher, HeaderStore, NodeMetrics,
    RateLimiter, ReorgTracker, VersionError, client::CLIENT_VERSION_METHOD,
};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::B256;
use async_trait::async_trait;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The minimum time between two version queries of the same node.
pub const VERSION_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// The health of a node, as decided by whoever polls it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize_repr,
    Deserialize_repr,
    derive_more::Display,
)]
#[repr(u8)]
pub enum NodeStatus {
    /// The last poll succeeded.
    #[default]
    #[display("ok")]
    Ok = 0,
    /// The last poll failed.
    #[display("unreachable")]
    Unreachable = 1,
}

/// A monitored endpoint and everything known about its view of the chain.
///
/// Status is never changed by the node itself: the poller calls
/// [`ChainNode::set_status`] based on the outcome of [`ChainNode::update_latest`].
#[async_trait]
pub trait ChainNode: Debug + Send {
    /// Returns the name of the node.
    fn name(&self) -> &str;

    /// Returns the client version, probing the node at most once per
    /// [`VERSION_CHECK_INTERVAL`].
    async fn version(&mut self) -> Result<String, VersionError>;

    /// Returns the current status.
    fn status(&self) -> NodeStatus;

    /// Sets the current status.
    fn set_status(&mut self, status: NodeStatus);

    /// Returns the unix time at which the head hash last changed, or zero if it never did.
    fn last_progress(&self) -> u64;

    /// Returns the latest head, if one has been fetched.
    fn latest(&self) -> Option<BlockInfo>;

    /// Returns the latest head number, or zero if no head has been fetched.
    fn head_num(&self) -> u64 {
        self.latest().map_or(0, |latest| latest.number)
    }

    /// Fetches the chain tip and records progress if its hash changed.
    async fn update_latest(&mut self) -> Result<(), FetchError>;

    /// Returns the block at `number`, surfacing fetch failures.
    ///
    /// Heights above the latest head yield `Ok(None)` without a network call. Unless
    /// `force` is set, a cached block is returned without a network call.
    async fn try_block_at(
        &mut self,
        number: u64,
        force: bool,
    ) -> Result<Option<BlockInfo>, FetchError>;

    /// Returns the block at `number`, or `None` if there is none or it could not be fetched.
    async fn block_at(&mut self, number: u64, force: bool) -> Option<BlockInfo> {
        match self.try_block_at(number, force).await {
            Ok(block) => block,
            Err(err) => {
                debug!(target: "headwatch::node", node = %self.name(), number, %err, "Block lookup failed");
                None
            }
        }
    }

    /// Returns the hash at `number`, with the same semantics as [`ChainNode::block_at`].
    async fn hash_at(&mut self, number: u64, force: bool) -> Option<B256> {
        self.block_at(number, force).await.map(|block| block.hash)
    }
}

/// A [`ChainNode`] reached over JSON-RPC.
///
/// Self-hosted and hosted providers share this type; they only differ in the client and
/// default version label handed to [`RpcNode::new`].
#[derive(Debug)]
pub struct RpcNode<C> {
    name: String,
    version: String,
    status: NodeStatus,
    last_progress: u64,
    latest: Option<BlockInfo>,
    tracker: ReorgTracker<C>,
    metrics: NodeMetrics,
    last_check: HashMap<&'static str, Instant>,
}

impl<C: HeaderClient> RpcNode<C> {
    /// Creates a new [`RpcNode`].
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        client: C,
        limiter: RateLimiter,
        store: Option<Arc<dyn HeaderStore>>,
        metrics: NodeMetrics,
        cancellation: CancellationToken,
    ) -> Self {
        let name = name.into();
        let fetcher = HeaderFetcher::new(name.clone(), client, limiter, store, cancellation);
        Self {
            name,
            version: version.into(),
            status: NodeStatus::Ok,
            last_progress: 0,
            latest: None,
            tracker: ReorgTracker::new(fetcher),
            metrics,
            last_check: HashMap::new(),
        }
    }

    /// Returns the blocks this node has reported so far.
    pub const fn history(&self) -> &ChainHistory {
        self.tracker.history()
    }

    /// Returns `true` if `method` was called within the last `interval`, recording a call
    /// at `now` otherwise.
    fn throttled(&mut self, method: &'static str, interval: Duration, now: Instant) -> bool {
        if self
            .last_check
            .get(method)
            .is_some_and(|last| now.saturating_duration_since(*last) < interval)
        {
            return true;
        }
        self.last_check.insert(method, now);
        false
    }
}

#[async_trait]
impl<C: HeaderClient> ChainNode for RpcNode<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn version(&mut self) -> Result<String, VersionError> {
        if self.throttled(CLIENT_VERSION_METHOD, VERSION_CHECK_INTERVAL, Instant::now()) {
            return Ok(self.version.clone());
        }

        match self.tracker.fetcher().client_version().await {
            Ok(version) => {
                self.version.clone_from(&version);
                Ok(version)
            }
            Err(source) => Err(VersionError { last_known: self.version.clone(), source }),
        }
    }

    fn status(&self) -> NodeStatus {
        self.status
    }

    fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    fn last_progress(&self) -> u64 {
        self.last_progress
    }

    fn latest(&self) -> Option<BlockInfo> {
        self.latest
    }

    async fn update_latest(&mut self) -> Result<(), FetchError> {
        let outcome = self.tracker.fetch_with_reorg_check(BlockNumberOrTag::Latest).await?;
        self.metrics.record_reorg(outcome.depth);

        let head = outcome.block;
        if self.latest.is_none_or(|latest| latest.hash != head.hash) {
            self.last_progress = unix_now();
            self.latest = Some(head);
            self.metrics.record_head(head.number);
            debug!(
                target: "headwatch::node",
                node = %self.name,
                number = head.number,
                hash = %head.hash,
                last_progress = self.last_progress,
                "Node progressed"
            );
        }
        Ok(())
    }

    async fn try_block_at(
        &mut self,
        number: u64,
        force: bool,
    ) -> Result<Option<BlockInfo>, FetchError> {
        if self.latest.is_some_and(|latest| number > latest.number) {
            return Ok(None);
        }
        if !force {
            if let Some(block) = self.tracker.history().get(number) {
                return Ok(Some(block));
            }
        }

        let outcome =
            self.tracker.fetch_with_reorg_check(BlockNumberOrTag::Number(number)).await?;
        self.metrics.record_reorg(outcome.depth);
        Ok(Some(outcome.block))
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs())
}
