//! Caller-side polling policy.

use futures::future::join_all;
use headwatch_nodes::{ChainNode, FetchError, NodeStatus};

/// Updates the head of every node concurrently.
///
/// A successful update marks the node [`NodeStatus::Ok`], a failed one marks it
/// [`NodeStatus::Unreachable`]. Cancelled updates leave the status untouched.
pub async fn poll_nodes(nodes: &mut [Box<dyn ChainNode>]) {
    join_all(nodes.iter_mut().map(|node| async move {
        match node.update_latest().await {
            Ok(()) => node.set_status(NodeStatus::Ok),
            Err(FetchError::Cancelled) => {}
            Err(err) => {
                warn!(target: "headwatch::poll", node = %node.name(), %err, "Failed to update head");
                node.set_status(NodeStatus::Unreachable);
            }
        }
    }))
    .await;
}

/// Returns up to `depth` heights ending at the highest head across `nodes`, newest first.
///
/// Empty if no node has a head yet.
pub fn report_numbers(nodes: &[Box<dyn ChainNode>], depth: u64) -> Vec<u64> {
    let Some(top) = nodes.iter().filter_map(|node| node.latest()).map(|head| head.number).max()
    else {
        return Vec::new();
    };
    (0..depth).map_while(|offset| top.checked_sub(offset)).collect()
}
