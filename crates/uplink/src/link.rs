//! Network link status

use reqwest::Url;
use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{lookup_host, UdpSocket};
use tracing::trace;

/// Observed state of the network link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Down,
    Up,
}

/// Source of link status, checked at startup and before every send.
///
/// Callers bound each check with a timeout and treat an expired check as
/// `Down`.
pub trait Link: Send + Sync {
    /// Current link status
    fn status(&self) -> impl Future<Output = LinkStatus> + Send;

    /// Check if the link is up
    fn is_up(&self) -> impl Future<Output = bool> + Send {
        async move { self.status().await == LinkStatus::Up }
    }
}

/// Treats the link as up when the host has a route to the collector.
///
/// Connecting a UDP socket sends nothing on the wire but fails with
/// "network unreachable" when no interface can reach the target. Name
/// resolution runs on tokio's resolver, off the calling worker.
#[derive(Debug, Clone)]
pub struct RouteLink {
    endpoint: Url,
}

impl RouteLink {
    /// Create a route check towards the collector endpoint
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }

    async fn has_route(addr: SocketAddr) -> bool {
        let local: SocketAddr = match addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        match UdpSocket::bind(local).await {
            Ok(socket) => socket.connect(addr).await.is_ok(),
            Err(_) => false,
        }
    }
}

impl Link for RouteLink {
    async fn status(&self) -> LinkStatus {
        let (Some(host), Some(port)) = (self.endpoint.host_str(), self.endpoint.port_or_known_default()) else {
            return LinkStatus::Down;
        };
        // IPv6 literals come back bracketed
        let host = host.trim_start_matches('[').trim_end_matches(']');

        let addrs = match lookup_host((host, port)).await {
            Ok(addrs) => addrs,
            Err(e) => {
                trace!("Cannot resolve {}: {}", self.endpoint, e);
                return LinkStatus::Down;
            }
        };

        for addr in addrs {
            if Self::has_route(addr).await {
                return LinkStatus::Up;
            }
        }
        LinkStatus::Down
    }
}
