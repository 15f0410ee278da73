//! Loading of the TOML node file.

use anyhow::{Context, Result, bail, ensure};
use headwatch_nodes::{
    ChainNode, DEFAULT_STORE_CAPACITY, HeaderStore, MemoryHeaderStore, NodeConfig, NodeMetrics,
};
use metrics::Recorder;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;

/// The contents of a node file.
///
/// ```toml
/// [[node]]
/// name = "geth"
/// kind = "rpc"
/// url = "http://127.0.0.1:8545"
/// rate_limit = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFile {
    /// Capacity of the header store shared by all nodes.
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,
    /// The monitored nodes, in report column order.
    #[serde(rename = "node", default)]
    pub nodes: Vec<NodeConfig>,
}

const fn default_store_capacity() -> usize {
    DEFAULT_STORE_CAPACITY
}

impl NodeFile {
    /// Reads and validates the node file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(target: "headwatch::config", path = %path.display(), "Loading node file");
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read node file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid node file {}", path.display()))
    }

    /// Parses and validates a node file.
    pub fn parse(raw: &str) -> Result<Self> {
        let file: Self = toml::from_str(raw)?;
        ensure!(!file.nodes.is_empty(), "No nodes configured");
        ensure!(file.store_capacity > 0, "store_capacity must be positive");

        let mut names = HashSet::with_capacity(file.nodes.len());
        for node in &file.nodes {
            if node.name.is_empty() {
                bail!("Node names must not be empty");
            }
            if !names.insert(node.name.as_str()) {
                bail!("Duplicate node name {:?}", node.name);
            }
        }
        Ok(file)
    }

    /// Builds every configured node, sharing one header store between them.
    pub fn build_nodes(
        &self,
        recorder: &dyn Recorder,
        cancellation: &CancellationToken,
    ) -> Result<Vec<Box<dyn ChainNode>>> {
        NodeMetrics::describe(recorder);
        let store: Arc<dyn HeaderStore> = Arc::new(MemoryHeaderStore::new(self.store_capacity));

        self.nodes
            .iter()
            .map(|config| {
                let node = config
                    .build(Some(Arc::clone(&store)), recorder, cancellation.clone())
                    .with_context(|| format!("Failed to build node {:?}", config.name))?;
                Ok(Box::new(node) as Box<dyn ChainNode>)
            })
            .collect()
    }
}
