//! Relay Error Types

use sensor_protocol::SensorError;
use thiserror::Error;
use uplink::UplinkError;

/// Errors surfaced by the relay binary
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but a value is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging or metrics could not be installed
    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),

    #[error(transparent)]
    Sensor(#[from] SensorError),

    #[error(transparent)]
    Uplink(#[from] UplinkError),

    /// A pipeline task panicked or was cancelled
    #[error("Pipeline task failed: {0}")]
    Task(String),
}
