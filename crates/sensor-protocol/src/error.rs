//! Sensor Error Types

use crate::command::SensorCommand;
use thiserror::Error;

/// Errors that can occur while talking to the sensor
#[derive(Debug, Error)]
pub enum SensorError {
    /// Serial port connection error
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// The byte stream reached end-of-file
    #[error("Sensor stream closed")]
    StreamClosed,

    /// A control command could not be written
    #[error("Failed to send {command:?} command: {reason}")]
    CommandFailed {
        command: SensorCommand,
        reason: String,
    },
}

impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        SensorError::SerialError(err.to_string())
    }
}

impl From<tokio_serial::Error> for SensorError {
    fn from(err: tokio_serial::Error) -> Self {
        SensorError::SerialError(err.to_string())
    }
}
