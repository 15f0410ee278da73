//! Construction-time description of a monitored node.

use crate::{AlloyHeaderClient, HeaderStore, NodeError, NodeMetrics, RateLimiter, RpcNode};
use metrics::Recorder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// The default Infura mainnet endpoint, completed by the project id.
pub const DEFAULT_INFURA_ENDPOINT: &str = "https://mainnet.infura.io/v3/";

/// The default Alchemy mainnet endpoint, completed by the API key.
pub const DEFAULT_ALCHEMY_ENDPOINT: &str = "https://eth-mainnet.g.alchemy.com/v2/";

/// Where and how a node is reached.
///
/// The variants differ only in how the URL is composed and in the version label a node
/// shows before its first successful version query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeEndpoint {
    /// A self-hosted JSON-RPC endpoint.
    Rpc {
        /// The endpoint URL.
        url: String,
    },
    /// An Infura project.
    Infura {
        /// The endpoint prefix.
        #[serde(default = "default_infura_endpoint")]
        endpoint: String,
        /// The project id appended to the endpoint.
        #[serde(default)]
        key: String,
    },
    /// An Alchemy app.
    Alchemy {
        /// The endpoint prefix.
        #[serde(default = "default_alchemy_endpoint")]
        endpoint: String,
        /// The API key appended to the endpoint.
        #[serde(default)]
        key: String,
    },
}

fn default_infura_endpoint() -> String {
    DEFAULT_INFURA_ENDPOINT.to_string()
}

fn default_alchemy_endpoint() -> String {
    DEFAULT_ALCHEMY_ENDPOINT.to_string()
}

impl NodeEndpoint {
    /// Returns the version label used until the node reports its own.
    pub const fn default_version(&self) -> &'static str {
        match self {
            Self::Rpc { .. } => "n/a",
            Self::Infura { .. } => "Infura V3",
            Self::Alchemy { .. } => "Alchemy V2",
        }
    }

    /// Composes the endpoint URL for the node called `node`.
    pub fn url(&self, node: &str) -> Result<Url, NodeError> {
        let raw = match self {
            Self::Rpc { url } => url.clone(),
            Self::Infura { endpoint, key } => hosted_url("infura", node, endpoint, key)?,
            Self::Alchemy { endpoint, key } => hosted_url("alchemy", node, endpoint, key)?,
        };
        Url::parse(&raw)
            .map_err(|source| NodeError::InvalidUrl { node: node.to_string(), source })
    }
}

fn hosted_url(
    provider: &'static str,
    node: &str,
    endpoint: &str,
    key: &str,
) -> Result<String, NodeError> {
    if key.is_empty() {
        return Err(NodeError::MissingApiKey { provider, node: node.to_string() });
    }
    Ok(format!("{endpoint}{key}"))
}

/// A named node and the limits it is polled under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// The display name of the node, unique within a deployment.
    pub name: String,
    /// How the node is reached.
    #[serde(flatten)]
    pub endpoint: NodeEndpoint,
    /// Maximum RPC calls per second. Zero means unlimited.
    #[serde(default)]
    pub rate_limit: u32,
}

impl NodeConfig {
    /// Builds an HTTP backed [`RpcNode`] for this configuration.
    pub fn build(
        &self,
        store: Option<Arc<dyn HeaderStore>>,
        recorder: &dyn Recorder,
        cancellation: CancellationToken,
    ) -> Result<RpcNode<AlloyHeaderClient>, NodeError> {
        let url = self.endpoint.url(&self.name)?;
        info!(
            target: "headwatch::node",
            node = %self.name,
            host = url.host_str().unwrap_or_default(),
            rate_limit = self.rate_limit,
            "Configured node"
        );
        Ok(RpcNode::new(
            self.name.clone(),
            self.endpoint.default_version(),
            AlloyHeaderClient::new_http(url),
            RateLimiter::new(self.rate_limit),
            store,
            NodeMetrics::register(&self.name, recorder),
            cancellation,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChainNode;

    #[test]
    fn test_rpc_url() {
        let endpoint = NodeEndpoint::Rpc { url: "http://127.0.0.1:8545".to_string() };
        assert_eq!(endpoint.url("geth").unwrap().as_str(), "http://127.0.0.1:8545/");
        assert_eq!(endpoint.default_version(), "n/a");
    }

    #[test]
    fn test_hosted_url_appends_key() {
        let endpoint = NodeEndpoint::Infura {
            endpoint: DEFAULT_INFURA_ENDPOINT.to_string(),
            key: "abc123".to_string(),
        };
        assert_eq!(endpoint.url("infura").unwrap().as_str(), "https://mainnet.infura.io/v3/abc123");
        assert_eq!(endpoint.default_version(), "Infura V3");
    }

    #[test]
    fn test_hosted_url_missing_key() {
        let endpoint = NodeEndpoint::Alchemy {
            endpoint: DEFAULT_ALCHEMY_ENDPOINT.to_string(),
            key: String::new(),
        };
        let err = endpoint.url("alchemy").unwrap_err();
        assert!(matches!(err, NodeError::MissingApiKey { provider: "alchemy", .. }));
    }

    #[test]
    fn test_invalid_url() {
        let endpoint = NodeEndpoint::Rpc { url: "not a url".to_string() };
        assert!(matches!(endpoint.url("bad").unwrap_err(), NodeError::InvalidUrl { .. }));
    }

    #[test]
    fn test_deserialize_node_list() {
        #[derive(Deserialize)]
        struct Nodes {
            node: Vec<NodeConfig>,
        }

        let nodes: Nodes = toml::from_str(
            r#"
            [[node]]
            name = "geth"
            kind = "rpc"
            url = "http://127.0.0.1:8545"
            rate_limit = 10

            [[node]]
            name = "infura"
            kind = "infura"
            key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(nodes.node.len(), 2);
        assert_eq!(nodes.node[0].rate_limit, 10);
        assert_eq!(
            nodes.node[1].endpoint,
            NodeEndpoint::Infura {
                endpoint: DEFAULT_INFURA_ENDPOINT.to_string(),
                key: "abc".to_string()
            }
        );
        assert_eq!(nodes.node[1].rate_limit, 0);
    }

    #[test]
    fn test_build_node() {
        let config = NodeConfig {
            name: "alchemy".to_string(),
            endpoint: NodeEndpoint::Alchemy {
                endpoint: DEFAULT_ALCHEMY_ENDPOINT.to_string(),
                key: "key".to_string(),
            },
            rate_limit: 5,
        };

        let node = config
            .build(None, &metrics::NoopRecorder, CancellationToken::new())
            .unwrap();
        assert_eq!(node.name(), "alchemy");
        assert!(node.latest().is_none());
    }
}
