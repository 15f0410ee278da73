//! Arguments shared between subcommands.

use crate::config::NodeFile;
use clap::Args;
use headwatch_cli::{LogArgs, MetricsArgs};
use std::path::PathBuf;

/// Global arguments for the CLI.
#[derive(Args, Default, Clone, Debug)]
pub struct GlobalArgs {
    /// Logging arguments.
    #[command(flatten)]
    pub log_args: LogArgs,
    /// Prometheus CLI arguments.
    #[command(flatten)]
    pub metrics: MetricsArgs,
}

/// Where the monitored nodes are described.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct NodeArgs {
    /// Path to the TOML node file.
    #[arg(long = "nodes", short = 'n', default_value = "nodes.toml", env = "HEADWATCH_NODES")]
    pub path: PathBuf,
}

impl NodeArgs {
    /// Loads and validates the node file.
    pub fn load(&self) -> anyhow::Result<NodeFile> {
        NodeFile::load(&self.path)
    }
}

/// Which heights a report covers.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct ReportArgs {
    /// Number of heights per report, ending at the highest known head.
    #[arg(long = "report-depth", default_value_t = 10, env = "HEADWATCH_REPORT_DEPTH")]
    pub depth: u64,
}
