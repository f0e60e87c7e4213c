//! Simulated sensor for running without hardware

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tracing::{debug, trace};

/// Interval between simulated records (~20 Hz)
const RECORD_INTERVAL_MS: u64 = 50;

/// Baseline concentration in ppm
const BASELINE_PPM: i32 = 420;

/// Spawn the simulated sensor and return the host side of its stream
pub(crate) fn spawn() -> DuplexStream {
    let (host, device) = tokio::io::duplex(1024);
    let (mut rx, mut tx) = tokio::io::split(device);

    // Commands from the host are only logged
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        while let Ok(n) = rx.read(&mut buf).await {
            if n == 0 {
                break;
            }
            debug!("Mock sensor received {:?}", String::from_utf8_lossy(&buf[..n]));
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(RECORD_INTERVAL_MS));
        let mut tick: u64 = 0;
        loop {
            interval.tick().await;
            let value = simulated_ppm(tick);
            tick += 1;

            let record = format!("Z {:05} z {:05}\r\n", value, value);
            if tx.write_all(record.as_bytes()).await.is_err() {
                trace!("Mock sensor stopped: host side closed");
                break;
            }
        }
    });

    host
}

/// Pseudo-random but deterministic reading around the baseline
fn simulated_ppm(tick: u64) -> i32 {
    let mut hasher = DefaultHasher::new();
    tick.hash(&mut hasher);
    let jitter = (hasher.finish() % 41) as i32 - 20;
    BASELINE_PPM + jitter
}
