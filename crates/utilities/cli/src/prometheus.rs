//! Utilities for spinning up a prometheus metrics exporter.

use crate::PrometheusError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
use std::net::{IpAddr, SocketAddr, TcpListener};

/// Builds a Prometheus recorder and serves it over HTTP on `addr:port`.
///
/// The exporter is spawned on the current tokio runtime. The recorder is returned instead of
/// being installed globally so that callers can hand it to whatever registers metrics. A
/// port of zero is resolved to a free port first.
pub fn init_prometheus_recorder(
    addr: IpAddr,
    port: u16,
) -> Result<PrometheusRecorder, PrometheusError> {
    let listen_addr = if port == 0 {
        let listener = TcpListener::bind((addr, 0))?;
        listener.local_addr()?
    } else {
        SocketAddr::from((addr, port))
    };

    let (recorder, exporter) = PrometheusBuilder::new().with_http_listener(listen_addr).build()?;
    tokio::spawn(async move {
        if let Err(err) = exporter.await {
            error!(target: "prometheus", ?err, "Metrics exporter stopped");
        }
    });

    info!(target: "prometheus", "Serving metrics at: http://{}", listen_addr);
    Ok(recorder)
}
