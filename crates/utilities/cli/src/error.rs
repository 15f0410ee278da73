//! Error types for CLI utilities.

use metrics_exporter_prometheus::BuildError;
use std::io;
use thiserror::Error;

/// Error type for prometheus exporter initialization.
#[derive(Debug, Error)]
pub enum PrometheusError {
    /// Failed to resolve the listen address.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] io::Error),
    /// Failed to build the recorder and exporter.
    #[error("failed to build prometheus exporter: {0}")]
    Build(#[from] BuildError),
}

/// Errors that can occur in CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// A global tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    Tracing(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error initializing metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInitialization(#[from] PrometheusError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
