//! Ping-Pong Slot Exchange
//!
//! Ownership of the two slots follows from the flags rather than a lock:
//! the producer owns the active slot, and the pending slot belongs to the
//! consumer for as long as `buffer_ready` is set.

use crate::{Batch, BATCH_SIZE};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Signals shared between the producer and consumer contexts.
///
/// Each flag has exactly one writer: `buffer_ready` is raised by the producer
/// and lowered by the consumer, `sending` is written by the consumer, and
/// `batch_dropped` by the producer.
#[derive(Debug, Default)]
pub struct PipelineFlags {
    buffer_ready: AtomicBool,
    sending: AtomicBool,
    batch_dropped: AtomicBool,
}

impl PipelineFlags {
    /// A completed batch awaits the consumer
    pub fn buffer_ready(&self) -> bool {
        self.buffer_ready.load(Ordering::Acquire)
    }

    /// The consumer is transmitting
    pub fn sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// A batch was discarded since the flag was last cleared
    pub fn batch_dropped(&self) -> bool {
        self.batch_dropped.load(Ordering::Acquire)
    }
}

/// Result of pushing one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Sample stored, batch not yet complete
    Stored,
    /// Batch completed and handed to the consumer
    Published,
    /// Batch completed while the previous one was still pending; discarded
    Dropped,
}

struct Shared {
    /// Pre-allocated slot storage
    slots: [UnsafeCell<[i32; BATCH_SIZE]>; 2],
    /// Index of the slot published to the consumer
    pending: AtomicUsize,
    flags: PipelineFlags,
    published_total: AtomicUsize,
    dropped_total: AtomicUsize,
}

// SAFETY: slot access is partitioned by the flag protocol. The producer only
// writes the active slot, which is never the pending slot while
// `buffer_ready` is set; the consumer only reads the pending slot between
// observing `buffer_ready` (acquire) and clearing it (release).
unsafe impl Sync for Shared {}

/// Create a connected producer/consumer pair over a fresh pair of slots
pub fn channel() -> (BatchProducer, BatchConsumer) {
    let shared = Arc::new(Shared {
        slots: [
            UnsafeCell::new([0; BATCH_SIZE]),
            UnsafeCell::new([0; BATCH_SIZE]),
        ],
        pending: AtomicUsize::new(0),
        flags: PipelineFlags::default(),
        published_total: AtomicUsize::new(0),
        dropped_total: AtomicUsize::new(0),
    });

    let producer = BatchProducer {
        shared: Arc::clone(&shared),
        active: 0,
        write_index: 0,
    };
    let consumer = BatchConsumer { shared };
    (producer, consumer)
}

/// Producer side: fills the active slot and publishes completed batches
pub struct BatchProducer {
    shared: Arc<Shared>,
    /// Slot currently being written
    active: usize,
    /// Next write position within the active slot
    write_index: usize,
}

impl BatchProducer {
    /// Append one averaged sample to the active slot
    pub fn push(&mut self, sample: i32) -> PushOutcome {
        // SAFETY: only the producer writes slots, and the active slot is
        // never the one the consumer may be reading (see `Shared`).
        unsafe {
            (*self.shared.slots[self.active].get())[self.write_index] = sample;
        }
        self.write_index += 1;

        if self.write_index < BATCH_SIZE {
            return PushOutcome::Stored;
        }
        self.write_index = 0;

        let flags = &self.shared.flags;
        if flags.buffer_ready.load(Ordering::Acquire) {
            flags.batch_dropped.store(true, Ordering::Release);
            let dropped = self.shared.dropped_total.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("Batch dropped: previous batch still pending (total dropped: {})", dropped);
            return PushOutcome::Dropped;
        }

        self.shared.pending.store(self.active, Ordering::Relaxed);
        flags.buffer_ready.store(true, Ordering::Release);
        self.active ^= 1;
        self.shared.published_total.fetch_add(1, Ordering::Relaxed);
        debug!("Batch published, slot {} now active", self.active);
        PushOutcome::Published
    }

    /// Lower `batch_dropped` once the drop has been surfaced
    pub fn clear_dropped(&self) {
        self.shared.flags.batch_dropped.store(false, Ordering::Release);
    }

    /// Shared pipeline flags
    pub fn flags(&self) -> &PipelineFlags {
        &self.shared.flags
    }

    /// Samples written into the active slot so far
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Total batches handed to the consumer
    pub fn published_total(&self) -> usize {
        self.shared.published_total.load(Ordering::Relaxed)
    }

    /// Total batches discarded under backpressure
    pub fn dropped_total(&self) -> usize {
        self.shared.dropped_total.load(Ordering::Relaxed)
    }
}

/// Consumer side: claims the pending batch
pub struct BatchConsumer {
    shared: Arc<Shared>,
}

impl BatchConsumer {
    /// Claim the pending batch, if any, and release its slot to the producer
    pub fn take(&mut self) -> Option<Batch> {
        let flags = &self.shared.flags;
        if !flags.buffer_ready.load(Ordering::Acquire) {
            return None;
        }

        let slot = self.shared.pending.load(Ordering::Relaxed);
        // SAFETY: `buffer_ready` is set, so the producer will not write this
        // slot until the release store below.
        let samples = unsafe { *self.shared.slots[slot].get() };
        flags.buffer_ready.store(false, Ordering::Release);

        Some(Batch::new(samples))
    }

    /// Mark whether a transmission is in progress
    pub fn set_sending(&self, sending: bool) {
        self.shared.flags.sending.store(sending, Ordering::Release);
    }

    /// Shared pipeline flags
    pub fn flags(&self) -> &PipelineFlags {
        &self.shared.flags
    }

    /// Total batches discarded under backpressure
    pub fn dropped_total(&self) -> usize {
        self.shared.dropped_total.load(Ordering::Relaxed)
    }
}
