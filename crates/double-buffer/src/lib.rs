//! Lock-Free Double Buffer
//!
//! Hands completed sample batches from the producer context to the consumer
//! context through two alternating slots and a set of atomic flags.

mod buffer;

pub use buffer::{channel, BatchConsumer, BatchProducer, PipelineFlags, PushOutcome};

/// Number of averaged samples in one batch
pub const BATCH_SIZE: usize = 10;

/// A completed, immutable batch of averaged samples in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    samples: [i32; BATCH_SIZE],
}

impl Batch {
    /// Create a batch from a full set of samples
    pub fn new(samples: [i32; BATCH_SIZE]) -> Self {
        Self { samples }
    }

    /// Samples in arrival order
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    /// Number of samples (always [`BATCH_SIZE`])
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the batch, for logging
    pub fn mean(&self) -> f64 {
        let sum: i64 = self.samples.iter().map(|&v| i64::from(v)).sum();
        sum as f64 / BATCH_SIZE as f64
    }
}
