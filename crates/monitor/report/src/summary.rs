//! Plain text summary of a single node.

use headwatch_nodes::ChainNode;

/// Renders what `node` reports at each of `numbers`.
///
/// The first line is `## <version>`, followed by one `<n>: <block>` line per height, with
/// `n/a` for heights the node has no block for.
pub async fn node_summary(node: &mut dyn ChainNode, numbers: &[u64]) -> String {
    let version = node.version().await.unwrap_or_else(|err| err.last_known);

    let mut summary = format!("## {version}\n");
    for number in numbers {
        match node.block_at(*number, false).await {
            Some(block) => summary.push_str(&format!("{number}: {block}\n")),
            None => summary.push_str(&format!("{number}: n/a\n")),
        }
    }
    summary
}
