//! Fixed-Window Averaging Filter

use sensor_protocol::parse_sample;
use tracing::trace;

/// Number of raw readings reduced to one averaged sample
pub const AVG_WINDOW: usize = 4;

/// Tumbling-window mean filter.
///
/// Every [`AVG_WINDOW`] readings produce exactly one output; nothing carries
/// over from one window to the next.
#[derive(Debug, Clone)]
pub struct AveragingWindow {
    window: [i32; AVG_WINDOW],
    position: usize,
}

impl AveragingWindow {
    /// Create an empty window
    pub fn new() -> Self {
        Self {
            window: [0; AVG_WINDOW],
            position: 0,
        }
    }

    /// Add a raw reading, returning the mean when the window fills up
    pub fn push(&mut self, value: i32) -> Option<i32> {
        self.window[self.position] = value;
        self.position += 1;

        if self.position < AVG_WINDOW {
            return None;
        }

        self.position = 0;
        let sum: i64 = self.window.iter().map(|&v| i64::from(v)).sum();
        // Truncating division; the mean of i32 values always fits in i32
        let mean = (sum / AVG_WINDOW as i64) as i32;
        trace!("Window mean {} from {:?}", mean, self.window);
        Some(mean)
    }

    /// Parse a sensor line and feed its reading; other lines are ignored
    pub fn accept_line(&mut self, line: &[u8]) -> Option<i32> {
        let value = parse_sample(line)?;
        self.push(value)
    }

    /// Number of readings waiting for the window to fill
    pub fn pending(&self) -> usize {
        self.position
    }

    /// Discard the partial window
    pub fn reset(&mut self) {
        self.window.fill(0);
        self.position = 0;
    }
}

impl Default for AveragingWindow {
    fn default() -> Self {
        Self::new()
    }
}
