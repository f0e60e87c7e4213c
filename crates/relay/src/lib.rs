//! CO2 Relay
//!
//! Reads a serial CO2 sensor, averages readings into fixed-size batches and
//! relays each batch to an HTTP collector, with a status LED reflecting the
//! pipeline state.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;

pub use config::{RelayConfig, SensorConfig, StatusConfig, UplinkConfig};
pub use error::RelayError;
pub use pipeline::{run, startup, DeliveryStats, PipelineReport, PipelineSettings, ProducerStats};
pub use telemetry::{init_logging, init_metrics};
