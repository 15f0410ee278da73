//! Error types for the headwatch nodes.

use alloy_eips::BlockNumberOrTag;
use alloy_transport::TransportError;
use thiserror::Error;

/// An error raised while fetching a header from a node.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The RPC call failed at the transport or JSON-RPC level.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The call succeeded but the node returned no header.
    #[error("node {node} returned no header for block {block}")]
    EmptyResponse {
        /// The name of the node.
        node: String,
        /// The requested block.
        block: BlockNumberOrTag,
    },
    /// The fetch was cancelled before the node answered.
    #[error("fetch cancelled")]
    Cancelled,
}

/// The ancestry walk stopped early because an ancestor could not be re-fetched.
///
/// This never fails the operation that triggered the walk: the requested header is still
/// returned, and only the ancestry confirmed so far is kept.
#[derive(Debug, Error)]
#[error("reorg walk aborted at block {number}: {source}")]
pub struct ReorgWalkAborted {
    /// The height whose re-fetch failed.
    pub number: u64,
    /// The underlying fetch failure.
    #[source]
    pub source: FetchError,
}

/// A version query failed.
///
/// Carries the last version string that was successfully reported by the node.
#[derive(Debug, Error)]
#[error("failed to query client version (last known: {last_known}): {source}")]
pub struct VersionError {
    /// The cached version string, unchanged by the failed query.
    pub last_known: String,
    /// The underlying fetch failure.
    #[source]
    pub source: FetchError,
}

/// An error raised by a [`crate::HeaderStore`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store lock was poisoned by a panicking writer.
    #[error("header store lock poisoned")]
    Poisoned,
    /// The backend rejected the write.
    #[error("header store backend error: {0}")]
    Backend(String),
}

/// An error raised while constructing a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A hosted provider was configured without its API key.
    #[error("missing {provider} key for node {node}")]
    MissingApiKey {
        /// The provider label, e.g. `infura`.
        provider: &'static str,
        /// The name of the node.
        node: String,
    },
    /// The composed endpoint URL could not be parsed.
    #[error("invalid url for node {node}: {source}")]
    InvalidUrl {
        /// The name of the node.
        node: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },
}
