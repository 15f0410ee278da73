//! Contains the [`HeaderFetcher`], the single path every RPC call of a node goes through.

use crate::{BlockInfo, FetchError, HeaderClient, HeaderStore, RateLimiter};
use alloy_eips::BlockNumberOrTag;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fetches headers for one node through its [`RateLimiter`].
///
/// Every fetched header is handed to the shared [`HeaderStore`] before being normalised
/// into a [`BlockInfo`]. No retries happen at this layer.
#[derive(Debug)]
pub struct HeaderFetcher<C> {
    /// The name of the node, used in logs and errors.
    name: String,
    /// The RPC client for the node.
    client: C,
    /// The pacing gate shared by all calls of this node.
    limiter: RateLimiter,
    /// Optional durable store for raw headers.
    store: Option<Arc<dyn HeaderStore>>,
    /// Cancels in-flight calls.
    cancellation: CancellationToken,
}

impl<C: HeaderClient> HeaderFetcher<C> {
    /// Creates a new [`HeaderFetcher`].
    pub fn new(
        name: impl Into<String>,
        client: C,
        limiter: RateLimiter,
        store: Option<Arc<dyn HeaderStore>>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { name: name.into(), client, limiter, store, cancellation }
    }

    /// Returns the name of the node this fetcher serves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetches the header at `block` and returns its [`BlockInfo`].
    pub async fn fetch_header(&self, block: BlockNumberOrTag) -> Result<BlockInfo, FetchError> {
        let header = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => return Err(FetchError::Cancelled),
            result = async {
                self.limiter.take().await;
                trace!(target: "headwatch::fetcher", node = %self.name, %block, "Fetching header");
                self.client.header_by_number(block).await
            } => result?,
        };

        let Some(header) = header else {
            return Err(FetchError::EmptyResponse { node: self.name.clone(), block });
        };

        if let Some(store) = &self.store {
            if let Err(err) = store.add(header.hash, &header) {
                warn!(
                    target: "headwatch::fetcher",
                    node = %self.name,
                    hash = %header.hash,
                    %err,
                    "Failed to persist header"
                );
            }
        }

        Ok(BlockInfo::from(&header))
    }

    /// Queries the client version string through the rate limiter.
    pub async fn client_version(&self) -> Result<String, FetchError> {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(FetchError::Cancelled),
            result = async {
                self.limiter.take().await;
                self.client.client_version().await
            } => result.map_err(Into::into),
        }
    }
}
