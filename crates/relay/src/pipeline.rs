//! Producer/consumer pipeline driver
//!
//! The producer reads the sensor, frames lines, averages readings and fills
//! the double buffer; it never touches the network. The consumer claims
//! completed batches and transmits them. The two only share the double
//! buffer and its flags.

use crate::error::RelayError;
use crate::telemetry;
use double_buffer::{BatchConsumer, BatchProducer, PushOutcome};
use sample_filter::AveragingWindow;
use sensor_protocol::{LineParser, SensorError, SensorLink};
use status_led::{Led, LedState, PipelineView, StatusIndicator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};
use uplink::{BatchTransmitter, ConnectionManager, Delivery, Link, Restart, Transport, UplinkError};

/// Read buffer size per producer tick
const READ_CHUNK: usize = 64;

/// Loop timing
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Interval between manual sensor polls
    pub poll_interval: Duration,
    /// Longest wait for sensor bytes per producer tick
    pub read_tick: Duration,
    /// Consumer sleep when no batch is pending
    pub consumer_poll: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            read_tick: Duration::from_millis(10),
            consumer_poll: Duration::from_millis(5),
        }
    }
}

/// Producer-side totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub lines: u64,
    pub samples: u64,
    pub published: u64,
    pub dropped: u64,
}

/// Consumer-side totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl DeliveryStats {
    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Sent { .. } => {
                self.sent += 1;
                metrics::counter!(telemetry::BATCHES_SENT).increment(1);
            }
            Delivery::Failed => {
                self.failed += 1;
                metrics::counter!(telemetry::BATCHES_FAILED).increment(1);
            }
            Delivery::Skipped => {
                self.skipped += 1;
                metrics::counter!(telemetry::BATCHES_SKIPPED).increment(1);
            }
        }
    }
}

/// Summary returned when the pipeline stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub producer: ProducerStats,
    pub delivery: DeliveryStats,
}

/// Bring the network link up, showing `Connecting` while waiting
pub async fn startup<L, R, D>(
    connection: &mut ConnectionManager<L, R>,
    indicator: &mut StatusIndicator<D>,
) -> Result<(), UplinkError>
where
    L: Link,
    R: Restart,
    D: Led,
{
    indicator.enter(LedState::Connecting, now());
    connection.connect(|_| indicator.refresh(now())).await?;
    indicator.enter(LedState::Waiting, now());
    Ok(())
}

/// Run the producer and consumer until the sensor stream ends
pub async fn run<T, L, D>(
    sensor: SensorLink,
    transmitter: BatchTransmitter<T, L>,
    indicator: StatusIndicator<D>,
    settings: PipelineSettings,
) -> Result<PipelineReport, RelayError>
where
    T: Transport + 'static,
    L: Link + 'static,
    D: Led + 'static,
{
    let (producer, consumer) = double_buffer::channel();
    let finished = Arc::new(AtomicBool::new(false));

    info!("Starting pipeline");
    let producer_task = tokio::spawn(produce(
        sensor,
        producer,
        indicator,
        settings,
        Arc::clone(&finished),
    ));
    let consumer_task = tokio::spawn(consume(consumer, transmitter, settings, finished));

    let producer = producer_task
        .await
        .map_err(|e| RelayError::Task(e.to_string()))?;
    let delivery = consumer_task
        .await
        .map_err(|e| RelayError::Task(e.to_string()))?;

    let producer = producer?;
    info!(
        "Pipeline stopped: {} published, {} dropped, {} sent, {} failed, {} skipped",
        producer.published, producer.dropped, delivery.sent, delivery.failed, delivery.skipped
    );
    Ok(PipelineReport { producer, delivery })
}

/// Producer loop: sensor bytes to published batches
async fn produce<D: Led>(
    mut sensor: SensorLink,
    mut producer: BatchProducer,
    mut indicator: StatusIndicator<D>,
    settings: PipelineSettings,
    finished: Arc<AtomicBool>,
) -> Result<ProducerStats, SensorError> {
    let mut parser = LineParser::new();
    let mut window = AveragingWindow::new();
    let mut stats = ProducerStats::default();
    let mut buf = [0u8; READ_CHUNK];
    let mut next_poll = Instant::now() + settings.poll_interval;

    let result = loop {
        let receiving = match timeout(settings.read_tick, sensor.read(&mut buf)).await {
            Ok(Ok(n)) => {
                parser.feed(&buf[..n], |line| {
                    stats.lines += 1;
                    let Some(sample) = window.accept_line(line) else {
                        return;
                    };
                    stats.samples += 1;
                    match producer.push(sample) {
                        PushOutcome::Stored => {}
                        PushOutcome::Published => {
                            stats.published += 1;
                            metrics::counter!(telemetry::BATCHES_PUBLISHED).increment(1);
                        }
                        PushOutcome::Dropped => {
                            stats.dropped += 1;
                            metrics::counter!(telemetry::BATCHES_DROPPED).increment(1);
                        }
                    }
                });
                true
            }
            Ok(Err(SensorError::StreamClosed)) => {
                warn!("Sensor stream closed");
                break Ok(stats);
            }
            Ok(Err(e)) => break Err(e),
            Err(_) => false,
        };

        if Instant::now() >= next_poll {
            if let Err(e) = sensor.poll().await {
                break Err(e);
            }
            next_poll = Instant::now() + settings.poll_interval;
        }

        let flags = producer.flags();
        let view = PipelineView {
            sending: flags.sending(),
            batch_dropped: flags.batch_dropped(),
            receiving,
        };
        if indicator.tick(view, now()).clear_drop {
            debug!("Drop surfaced, clearing flag");
            producer.clear_dropped();
        }
    };

    finished.store(true, Ordering::Release);
    result
}

/// Consumer loop: pending batches to the collector
async fn consume<T: Transport, L: Link>(
    mut consumer: BatchConsumer,
    transmitter: BatchTransmitter<T, L>,
    settings: PipelineSettings,
    finished: Arc<AtomicBool>,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();

    loop {
        // Read before `take` so a batch published just before shutdown is still seen
        let producer_done = finished.load(Ordering::Acquire);

        match consumer.take() {
            Some(batch) => {
                consumer.set_sending(true);
                let delivery = transmitter.transmit(&batch).await;
                consumer.set_sending(false);
                stats.record(delivery);
            }
            None if producer_done => break,
            None => tokio::time::sleep(settings.consumer_poll).await,
        }
    }

    debug!(
        "Consumer drained, {} batches dropped upstream",
        consumer.dropped_total()
    );
    stats
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}
