//! Serial Link to the CO2 Sensor
//!
//! Provides async serial communication with the sensor.

use crate::command::SensorCommand;
use crate::error::SensorError;
use crate::mock;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, StopBits};
use tracing::{debug, info};

/// Default pause between startup commands
const DEFAULT_COMMAND_GAP_MS: u64 = 100;

type Reader = Box<dyn AsyncRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Byte-oriented link to the sensor
pub struct SensorLink {
    /// Serial port device path (e.g., "/dev/ttyUSB0" or "COM3")
    device: String,
    reader: Reader,
    writer: Writer,
    /// Pause between consecutive startup commands
    command_gap: Duration,
}

impl SensorLink {
    /// Open the serial port at `baud_rate`, 8N1
    pub fn open(device: &str, baud_rate: u32) -> Result<Self, SensorError> {
        info!("Opening sensor link on {} at {} baud", device, baud_rate);

        let stream = tokio_serial::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open_native_async()?;

        Ok(Self::from_stream(device, stream))
    }

    /// Create a link backed by the simulated sensor (no hardware required).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mock() -> Self {
        info!("Creating mock sensor link");
        Self::from_stream("mock", mock::spawn())
    }

    /// Wrap any bidirectional byte stream
    pub fn from_stream<S>(device: &str, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            device: device.to_string(),
            reader: Box::new(reader),
            writer: Box::new(writer),
            command_gap: Duration::from_millis(DEFAULT_COMMAND_GAP_MS),
        }
    }

    /// Send the startup sequence: identify, enable streaming, kickstart
    pub async fn initialize(&mut self) -> Result<(), SensorError> {
        info!("Initializing sensor on {}", self.device);

        for command in SensorCommand::STARTUP {
            self.send(command).await?;
            tokio::time::sleep(self.command_gap).await;
        }

        info!("Sensor streaming enabled");
        Ok(())
    }

    /// Request a reading manually, in addition to the stream
    pub async fn poll(&mut self) -> Result<(), SensorError> {
        self.send(SensorCommand::Poll).await
    }

    /// Write one control command
    pub async fn send(&mut self, command: SensorCommand) -> Result<(), SensorError> {
        debug!("Sending {:?} to sensor", command);

        let result = match self.writer.write_all(command.as_bytes()).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };

        result.map_err(|e| SensorError::CommandFailed {
            command,
            reason: e.to_string(),
        })
    }

    /// Read whatever bytes are available; end-of-stream is an error
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        match self.reader.read(buf).await? {
            0 => Err(SensorError::StreamClosed),
            n => Ok(n),
        }
    }

    /// Set the pause between startup commands
    pub fn set_command_gap(&mut self, gap: Duration) {
        self.command_gap = gap;
    }

    /// Get the device path
    pub fn device(&self) -> &str {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_initialize_sends_startup_sequence() {
        let (local, mut remote) = tokio::io::duplex(256);
        let mut link = SensorLink::from_stream("test", local);

        link.initialize().await.unwrap();
        link.poll().await.unwrap();
        drop(link);

        let mut written = Vec::new();
        remote.read_to_end(&mut written).await.unwrap();
        assert_eq!(written, b"Y\r\nK 1\r\n\r\nZ\r\n");
    }

    #[tokio::test]
    async fn test_read_reports_stream_closed() {
        let (local, mut remote) = tokio::io::duplex(64);
        let mut link = SensorLink::from_stream("test", local);

        remote.write_all(b"Z 1\n").await.unwrap();
        drop(remote);

        let mut buf = [0u8; 16];
        assert_eq!(link.read(&mut buf).await.unwrap(), 4);
        assert!(matches!(
            link.read(&mut buf).await,
            Err(SensorError::StreamClosed)
        ));
    }

    #[tokio::test]
    async fn test_mock_link_streams_records() {
        let mut link = SensorLink::mock();
        assert_eq!(link.device(), "mock");

        let mut parser = crate::LineParser::new();
        let mut readings = Vec::new();
        let mut buf = [0u8; 64];
        while readings.len() < 3 {
            let n = link.read(&mut buf).await.unwrap();
            parser.feed(&buf[..n], |line| {
                if let Some(value) = crate::parse_sample(line) {
                    readings.push(value);
                }
            });
        }
        assert!(readings.iter().all(|v| (300..=600).contains(v)));
    }
}
