//! Watch Subcommand

use crate::{
    flags::{NodeArgs, ReportArgs},
    poll::{poll_nodes, report_numbers},
};
use anyhow::{Context, Result};
use clap::Parser;
use headwatch_nodes::ChainNode;
use headwatch_report::Report;
use metrics::Recorder;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// The `watch` Subcommand
///
/// Polls every node on an interval and periodically reports where they disagree.
///
/// # Usage
///
/// ```sh
/// headwatch watch --nodes nodes.toml [--report-output report.json]
/// ```
#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[command(about = "Polls nodes forever and reports divergence")]
pub struct WatchCommand {
    /// The node file.
    #[command(flatten)]
    pub nodes: NodeArgs,
    /// Seconds between two polls of every node.
    #[arg(
        long = "poll-interval",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "HEADWATCH_POLL_INTERVAL"
    )]
    pub poll_interval: u64,
    /// Seconds between two reports.
    #[arg(
        long = "report-interval",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "HEADWATCH_REPORT_INTERVAL"
    )]
    pub report_interval: u64,
    /// The heights to report on.
    #[command(flatten)]
    pub report: ReportArgs,
    /// Write every report as JSON to this file.
    #[arg(long = "report-output", env = "HEADWATCH_REPORT_OUTPUT")]
    pub report_output: Option<PathBuf>,
}

impl WatchCommand {
    /// Runs the subcommand until `cancellation` fires.
    pub async fn run(self, recorder: &dyn Recorder, cancellation: CancellationToken) -> Result<()> {
        let mut nodes = self.nodes.load()?.build_nodes(recorder, &cancellation)?;
        info!(target: "headwatch", nodes = nodes.len(), "Watching nodes");
        self.watch(&mut nodes, cancellation).await;
        Ok(())
    }

    /// Drives the poll and report loops over `nodes`.
    pub async fn watch(&self, nodes: &mut [Box<dyn ChainNode>], cancellation: CancellationToken) {
        let mut poll = interval(Duration::from_secs(self.poll_interval));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut report = interval(Duration::from_secs(self.report_interval));
        report.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    info!(target: "headwatch", "Watch cancelled");
                    return;
                }
                _ = poll.tick() => poll_nodes(nodes).await,
                _ = report.tick() => self.report(nodes).await,
            }
        }
    }

    async fn report(&self, nodes: &mut [Box<dyn ChainNode>]) {
        let numbers = report_numbers(nodes, self.report.depth);
        if numbers.is_empty() {
            debug!(target: "headwatch", "No heads known yet, skipping report");
            return;
        }

        let report = Report::build(nodes, numbers).await;
        debug!(target: "headwatch", "Report\n{}", report.to_table());
        for number in report.divergent_rows() {
            warn!(
                target: "headwatch",
                number,
                hashes = ?report.rows.get(&number),
                "Nodes disagree on block hash"
            );
        }

        if let Some(path) = &self.report_output {
            if let Err(err) = write_report(path, &report) {
                warn!(
                    target: "headwatch",
                    path = %path.display(),
                    err = %format!("{err:#}"),
                    "Failed to write report"
                );
            }
        }
    }
}

fn write_report(path: &Path, report: &Report) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
