//! Assembly of a [`Report`] from a set of nodes.

use crate::{NodeColumn, Report};
use alloy_primitives::B256;
use futures::future::join_all;
use headwatch_nodes::{BlockInfo, ChainNode};
use std::collections::BTreeSet;

/// What one node reported for a list of heights.
#[derive(Debug)]
struct NodeView {
    column: NodeColumn,
    blocks: Vec<Option<BlockInfo>>,
}

impl NodeView {
    async fn capture(node: &mut dyn ChainNode, numbers: &[u64]) -> Self {
        let version = match node.version().await {
            Ok(version) => version,
            Err(err) => {
                debug!(target: "headwatch::report", node = %node.name(), %err, "Version query failed");
                err.last_known
            }
        };

        let mut blocks = Vec::with_capacity(numbers.len());
        for number in numbers {
            blocks.push(node.block_at(*number, false).await);
        }

        Self {
            column: NodeColumn {
                version,
                name: node.name().to_string(),
                status: node.status(),
                last_progress: node.last_progress(),
            },
            blocks,
        }
    }
}

/// Incrementally builds a [`Report`], one node at a time.
#[derive(Debug)]
pub struct ReportBuilder {
    report: Report,
    hashes: BTreeSet<B256>,
}

impl ReportBuilder {
    /// Creates a builder for the given heights. Rows follow the order of `numbers`.
    pub fn new(numbers: Vec<u64>) -> Self {
        let report = Report {
            rows: numbers.iter().map(|number| (*number, Vec::new())).collect(),
            numbers,
            ..Default::default()
        };
        Self { report, hashes: BTreeSet::new() }
    }

    /// Returns the heights this builder reports on.
    pub fn numbers(&self) -> &[u64] {
        &self.report.numbers
    }

    /// Queries `node` at every height and appends it as the next column.
    ///
    /// Cached blocks are used where present; heights the node cannot serve become empty
    /// cells.
    pub async fn add_node(&mut self, node: &mut dyn ChainNode) {
        let view = NodeView::capture(node, &self.report.numbers).await;
        self.push(view);
    }

    fn push(&mut self, view: NodeView) {
        for (number, block) in self.report.numbers.iter().zip(view.blocks) {
            let cell = block.map_or_else(String::new, |block| {
                self.hashes.insert(block.hash);
                block.hash.to_string()
            });
            self.report.rows.entry(*number).or_default().push(cell);
        }
        self.report.cols.push(view.column);
    }

    /// Finishes the report.
    pub fn finish(self) -> Report {
        let Self { mut report, hashes } = self;
        report.hashes = hashes.into_iter().collect();
        report
    }
}

impl Report {
    /// Builds a report over `nodes` at the given heights.
    ///
    /// Nodes are queried concurrently, each one sequentially over `numbers`. Columns keep
    /// the order of `nodes`.
    pub async fn build(nodes: &mut [Box<dyn ChainNode>], numbers: Vec<u64>) -> Self {
        let mut builder = ReportBuilder::new(numbers);
        let views = {
            let numbers = builder.numbers();
            join_all(nodes.iter_mut().map(|node| NodeView::capture(node.as_mut(), numbers))).await
        };
        for view in views {
            builder.push(view);
        }
        builder.finish()
    }
}
