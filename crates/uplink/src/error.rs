//! Uplink Error Types

use thiserror::Error;

/// Errors that can occur while delivering batches
#[derive(Debug, Error)]
pub enum UplinkError {
    /// Network link is not established
    #[error("Network link is down")]
    NotConnected,

    /// Link did not come up during startup
    #[error("Network link not established within {0}ms")]
    ConnectTimeout(u64),

    /// Request exceeded the transmit timeout
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Collector answered with a non-success status
    #[error("Collector returned HTTP {0}")]
    Status(u16),

    /// Transport-level failure (DNS, connect, reset)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Endpoint URL cannot be used
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
