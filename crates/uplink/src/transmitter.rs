//! Batch transmitter

use crate::body::encode_body;
use crate::link::Link;
use crate::transport::Transport;
use double_buffer::Batch;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Upper bound on the link check made before each send
pub const DEFAULT_LINK_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// What happened to a batch handed to the transmitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Collector accepted the batch
    Sent { status: u16 },
    /// Link was down; nothing was sent
    Skipped,
    /// Send attempted and failed; the batch is gone
    Failed,
}

/// Sends each batch at most once; failures are logged and absorbed
pub struct BatchTransmitter<T, L> {
    transport: T,
    link: Arc<L>,
    link_check_timeout: Duration,
}

impl<T: Transport, L: Link> BatchTransmitter<T, L> {
    /// Create a transmitter gated by `link`
    pub fn new(transport: T, link: Arc<L>) -> Self {
        Self {
            transport,
            link,
            link_check_timeout: DEFAULT_LINK_CHECK_TIMEOUT,
        }
    }

    /// Bound the pre-send link check; an expired check counts as down
    pub fn with_link_check_timeout(mut self, link_check_timeout: Duration) -> Self {
        self.link_check_timeout = link_check_timeout;
        self
    }

    /// Deliver one batch. Never retries.
    pub async fn transmit(&self, batch: &Batch) -> Delivery {
        if !self.link_is_up().await {
            warn!("Network link down, skipping batch (mean {:.1})", batch.mean());
            return Delivery::Skipped;
        }

        match self.transport.post(encode_body(batch.samples())).await {
            Ok(status) => {
                info!("Batch of {} sent, HTTP {}", batch.len(), status);
                Delivery::Sent { status }
            }
            Err(e) => {
                warn!("Batch of {} lost: {}", batch.len(), e);
                Delivery::Failed
            }
        }
    }

    async fn link_is_up(&self) -> bool {
        match timeout(self.link_check_timeout, self.link.is_up()).await {
            Ok(up) => up,
            Err(_) => {
                warn!(
                    "Link check timed out after {}ms",
                    self.link_check_timeout.as_millis()
                );
                false
            }
        }
    }
}
