//! Startup connection and restart policy

use crate::error::UplinkError;
use crate::link::Link;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info};

/// Connection lifecycle as seen by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Timing of the startup connection
#[derive(Debug, Clone, Copy)]
pub struct ConnectConfig {
    /// Give up and restart after this long (default: 20 s)
    pub timeout: Duration,
    /// Interval between status checks (default: 500 ms)
    pub poll_interval: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Action taken when the link cannot be established
pub trait Restart: Send + Sync {
    /// Restart the device; real implementations do not return
    fn restart(&self, reason: &str);
}

/// Exits the process so the service supervisor starts a fresh instance
#[derive(Debug, Clone, Copy)]
pub struct ExitRestart {
    /// Process exit status (default: 75, EX_TEMPFAIL)
    pub code: i32,
}

impl Default for ExitRestart {
    fn default() -> Self {
        Self { code: 75 }
    }
}

impl Restart for ExitRestart {
    fn restart(&self, reason: &str) {
        error!("Restarting: {}", reason);
        std::process::exit(self.code);
    }
}

/// Brings the link up once at startup
pub struct ConnectionManager<L, R> {
    link: Arc<L>,
    restart: R,
    config: ConnectConfig,
    state: ConnectionState,
}

impl<L: Link, R: Restart> ConnectionManager<L, R> {
    /// Create a new connection manager
    pub fn new(link: Arc<L>, restart: R, config: ConnectConfig) -> Self {
        Self {
            link,
            restart,
            config,
            state: ConnectionState::Disconnected,
        }
    }

    /// Wait for the link to come up, polling its status.
    ///
    /// `on_poll` runs before every status check so the caller can animate
    /// its indicator. A status check still running at the deadline is
    /// abandoned. If the link is still down when the timeout elapses the
    /// restart action is invoked exactly once and `ConnectTimeout` is
    /// returned (only reached when the restart action returns).
    pub async fn connect(&mut self, mut on_poll: impl FnMut(ConnectionState)) -> Result<(), UplinkError> {
        info!(
            "Connecting network link (timeout {}ms)",
            self.config.timeout.as_millis()
        );
        self.state = ConnectionState::Connecting;
        let started = Instant::now();
        let deadline = started + self.config.timeout;

        loop {
            on_poll(self.state);

            if let Ok(true) = timeout_at(deadline, self.link.is_up()).await {
                self.state = ConnectionState::Connected;
                info!("Network link up after {}ms", started.elapsed().as_millis());
                return Ok(());
            }

            if Instant::now() >= deadline {
                self.state = ConnectionState::Disconnected;
                let timeout_ms = self.config.timeout.as_millis() as u64;
                error!("Network link not established within {}ms", timeout_ms);
                self.restart.restart("network connection timeout");
                return Err(UplinkError::ConnectTimeout(timeout_ms));
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }
}
