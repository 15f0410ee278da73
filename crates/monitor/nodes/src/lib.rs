//! Head tracking for independently operated RPC endpoints.
//!
//! Each monitored endpoint is wrapped in an [`RpcNode`], which owns a rate limited
//! [`HeaderFetcher`], a [`ChainHistory`] of the headers it has seen, and a
//! [`ReorgTracker`] that walks parent hashes back through that history whenever a new
//! header arrives. Nodes are driven through the object safe [`ChainNode`] trait so that
//! reports can be assembled over a heterogeneous set of providers.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod block;
pub use block::BlockInfo;

mod limiter;
pub use limiter::RateLimiter;

mod client;
pub use client::{AlloyHeaderClient, HeaderClient};

mod store;
pub use store::{DEFAULT_STORE_CAPACITY, HeaderStore, MemoryHeaderStore};

mod fetcher;
pub use fetcher::HeaderFetcher;

mod history;
pub use history::ChainHistory;

mod reorg;
pub use reorg::{ReorgOutcome, ReorgTracker};

mod config;
pub use config::{DEFAULT_ALCHEMY_ENDPOINT, DEFAULT_INFURA_ENDPOINT, NodeConfig, NodeEndpoint};

mod metrics;
pub use self::metrics::NodeMetrics;

mod node;
pub use node::{ChainNode, NodeStatus, RpcNode, VERSION_CHECK_INTERVAL};

mod errors;
pub use errors::{FetchError, NodeError, ReorgWalkAborted, StoreError, VersionError};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
