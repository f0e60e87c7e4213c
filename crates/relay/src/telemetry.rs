//! Logging and metrics setup

use crate::error::RelayError;
use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub const BATCHES_PUBLISHED: &str = "relay_batches_published_total";
pub const BATCHES_DROPPED: &str = "relay_batches_dropped_total";
pub const BATCHES_SENT: &str = "relay_batches_sent_total";
pub const BATCHES_FAILED: &str = "relay_batches_failed_total";
pub const BATCHES_SKIPPED: &str = "relay_batches_skipped_total";

/// Initialize logging
pub fn init_logging(level: Level) -> Result<(), RelayError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| RelayError::Telemetry(e.to_string()))
}

/// Install the Prometheus exporter and describe the relay counters.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(listen: SocketAddr) -> Result<(), RelayError> {
    PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()
        .map_err(|e| RelayError::Telemetry(e.to_string()))?;

    describe_counter!(BATCHES_PUBLISHED, Unit::Count, "Batches handed to the consumer");
    describe_counter!(BATCHES_DROPPED, Unit::Count, "Batches discarded because the previous one was pending");
    describe_counter!(BATCHES_SENT, Unit::Count, "Batches accepted by the collector");
    describe_counter!(BATCHES_FAILED, Unit::Count, "Batches lost to transport errors");
    describe_counter!(BATCHES_SKIPPED, Unit::Count, "Batches skipped while the link was down");

    info!("Metrics exporter listening on {}", listen);
    Ok(())
}
