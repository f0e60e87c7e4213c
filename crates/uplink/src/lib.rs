//! Collector Uplink
//!
//! Delivers completed batches to the remote collector:
//! - Plain-text batch encoding
//! - HTTP transport with a bounded timeout
//! - Link status checks before every send
//! - Startup connection with a fatal restart on timeout

mod body;
mod connection;
mod error;
mod link;
mod transmitter;
mod transport;

pub use body::{encode_body, BODY_MARKER};
pub use connection::{ConnectConfig, ConnectionManager, ConnectionState, ExitRestart, Restart};
pub use error::UplinkError;
pub use link::{Link, LinkStatus, RouteLink};
pub use transmitter::{BatchTransmitter, Delivery, DEFAULT_LINK_CHECK_TIMEOUT};
pub use transport::{HttpTransport, Transport, DEFAULT_TRANSMIT_TIMEOUT};

pub use reqwest::Url;
