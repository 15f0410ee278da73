//! Check Subcommand

use crate::{
    flags::{NodeArgs, ReportArgs},
    poll::{poll_nodes, report_numbers},
};
use anyhow::{Result, ensure};
use clap::Parser;
use headwatch_nodes::ChainNode;
use headwatch_report::{Report, node_summary};
use metrics::Recorder;
use tokio_util::sync::CancellationToken;

/// The `check` Subcommand
///
/// Polls every node once and prints a single report.
///
/// # Usage
///
/// ```sh
/// headwatch check --nodes nodes.toml [--summaries] [--json]
/// ```
#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[command(about = "Polls every node once and prints a report")]
pub struct CheckCommand {
    /// The node file.
    #[command(flatten)]
    pub nodes: NodeArgs,
    /// The heights to report on.
    #[command(flatten)]
    pub report: ReportArgs,
    /// Append a plain text summary per node.
    #[arg(long = "summaries")]
    pub summaries: bool,
    /// Print the report as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

impl CheckCommand {
    /// Runs the subcommand.
    pub async fn run(self, recorder: &dyn Recorder, cancellation: CancellationToken) -> Result<()> {
        let mut nodes = self.nodes.load()?.build_nodes(recorder, &cancellation)?;
        let output = self.check(&mut nodes).await?;
        println!("{output}");
        Ok(())
    }

    /// Polls `nodes` once and renders the report.
    pub async fn check(&self, nodes: &mut [Box<dyn ChainNode>]) -> Result<String> {
        poll_nodes(nodes).await;
        let numbers = report_numbers(nodes, self.report.depth);
        ensure!(!numbers.is_empty(), "No node reported a head");

        let report = Report::build(nodes, numbers.clone()).await;
        let mut output =
            if self.json { serde_json::to_string_pretty(&report)? } else { report.to_table() };

        if self.summaries {
            for node in nodes.iter_mut() {
                output.push_str("\n\n");
                output.push_str(&node_summary(node.as_mut(), &numbers).await);
            }
        }
        Ok(output)
    }
}
