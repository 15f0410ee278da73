//! The RPC seam between a node and the endpoint it monitors.

use alloy_eips::BlockNumberOrTag;
use alloy_rpc_client::{ReqwestClient, RpcClient};
use alloy_rpc_types_eth::{Block, Header};
use alloy_transport::TransportError;
use async_trait::async_trait;
use std::fmt::Debug;
use url::Url;

/// The JSON-RPC method used to query the client version.
pub(crate) const CLIENT_VERSION_METHOD: &str = "web3_clientVersion";

/// Client trait wrapping the RPC calls a node needs from its endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeaderClient: Debug + Send + Sync {
    /// Fetches the header at the given height, or the tip for [`BlockNumberOrTag::Latest`].
    ///
    /// Returns `Ok(None)` if the endpoint answered without a header.
    async fn header_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> Result<Option<Header>, TransportError>;

    /// Queries the client version string reported by the endpoint.
    async fn client_version(&self) -> Result<String, TransportError>;
}

/// A [`HeaderClient`] backed by an alloy [`RpcClient`].
#[derive(Debug, Clone)]
pub struct AlloyHeaderClient {
    /// The inner RPC client.
    rpc_client: RpcClient,
}

impl AlloyHeaderClient {
    /// Creates a new [`AlloyHeaderClient`] from an existing [`RpcClient`].
    pub const fn new(rpc_client: RpcClient) -> Self {
        Self { rpc_client }
    }

    /// Creates a new [`AlloyHeaderClient`] talking HTTP to the given [`Url`].
    pub fn new_http(url: Url) -> Self {
        Self::new(ReqwestClient::new_http(url))
    }
}

#[async_trait]
impl HeaderClient for AlloyHeaderClient {
    async fn header_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> Result<Option<Header>, TransportError> {
        let block: Option<Block> =
            self.rpc_client.request("eth_getBlockByNumber", (block, false)).await?;
        Ok(block.map(|block| block.header))
    }

    async fn client_version(&self) -> Result<String, TransportError> {
        self.rpc_client.request(CLIENT_VERSION_METHOD, ()).await
    }
}
