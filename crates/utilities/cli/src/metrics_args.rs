//! Prometheus metrics arguments.

use crate::{PrometheusError, init_prometheus_recorder};
use clap::Args;
use metrics_exporter_prometheus::PrometheusRecorder;
use std::net::{IpAddr, Ipv4Addr};

/// Configuration for the Prometheus exporter.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Serve metrics over HTTP.
    #[arg(long = "metrics.enabled", env = "HEADWATCH_METRICS_ENABLED")]
    pub enabled: bool,
    /// Address the metrics server listens on.
    #[arg(long = "metrics.addr", default_value = "0.0.0.0", env = "HEADWATCH_METRICS_ADDR")]
    pub addr: IpAddr,
    /// Port the metrics server listens on. Zero picks a free port.
    #[arg(long = "metrics.port", default_value_t = 9090, env = "HEADWATCH_METRICS_PORT")]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Starts the exporter if enabled and returns its recorder.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init_metrics(&self) -> Result<Option<PrometheusRecorder>, PrometheusError> {
        if !self.enabled {
            return Ok(None);
        }
        init_prometheus_recorder(self.addr, self.port).map(Some)
    }
}
