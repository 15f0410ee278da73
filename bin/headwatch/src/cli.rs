//! Contains the headwatch CLI.

use crate::{
    commands::{CheckCommand, WatchCommand},
    flags::GlobalArgs,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use headwatch_cli::cli_styles;
use metrics::{NoopRecorder, Recorder};
use tokio_util::sync::CancellationToken;

/// The headwatch CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub struct Cli {
    /// Global arguments for the CLI.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// The subcommand to run.
    #[command(subcommand)]
    pub subcommand: Commands,
}

/// Subcommands for the CLI.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Poll nodes forever and report on an interval.
    #[command(alias = "w")]
    Watch(WatchCommand),
    /// Poll nodes once and print a report.
    #[command(alias = "c")]
    Check(CheckCommand),
}

impl Cli {
    /// Runs the CLI.
    pub fn run(self) -> Result<()> {
        self.global.log_args.init_tracing_subscriber(None)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to build tokio runtime")?;
        runtime.block_on(self.start())
    }

    async fn start(self) -> Result<()> {
        let recorder: Box<dyn Recorder + Send + Sync> = match self.global.metrics.init_metrics()? {
            Some(recorder) => Box::new(recorder),
            None => Box::new(NoopRecorder),
        };

        let cancellation = CancellationToken::new();
        cancel_on_ctrl_c(cancellation.clone());

        match self.subcommand {
            Commands::Watch(watch) => watch.run(recorder.as_ref(), cancellation).await,
            Commands::Check(check) => check.run(recorder.as_ref(), cancellation).await,
        }
    }
}

fn cancel_on_ctrl_c(cancellation: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(target: "headwatch", "Received ctrl-c, shutting down");
                cancellation.cancel();
            }
            Err(err) => error!(target: "headwatch", %err, "Failed to listen for ctrl-c"),
        }
    });
}
