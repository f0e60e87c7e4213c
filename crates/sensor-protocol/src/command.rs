//! Sensor Control Commands

/// Factory default baud rate of the sensor UART (8N1)
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Control strings understood by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    /// Identification / firmware query
    Identify,
    /// Switch to continuous streaming mode (`K 1`)
    StreamingMode,
    /// Bare line terminator that flushes the sensor's command parser
    Kickstart,
    /// Manual request for one filtered CO2 reading
    Poll,
}

impl SensorCommand {
    /// Commands sent once, in order, when the link comes up
    pub const STARTUP: [SensorCommand; 3] = [
        SensorCommand::Identify,
        SensorCommand::StreamingMode,
        SensorCommand::Kickstart,
    ];

    /// Get the raw bytes written to the serial port
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            SensorCommand::Identify => b"Y\r\n",
            SensorCommand::StreamingMode => b"K 1\r\n",
            SensorCommand::Kickstart => b"\r\n",
            SensorCommand::Poll => b"Z\r\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_order() {
        assert_eq!(
            SensorCommand::STARTUP,
            [
                SensorCommand::Identify,
                SensorCommand::StreamingMode,
                SensorCommand::Kickstart
            ]
        );
        assert!(!SensorCommand::STARTUP.contains(&SensorCommand::Poll));
    }

    #[test]
    fn test_commands_are_crlf_terminated() {
        for command in [
            SensorCommand::Identify,
            SensorCommand::StreamingMode,
            SensorCommand::Kickstart,
            SensorCommand::Poll,
        ] {
            assert!(command.as_bytes().ends_with(b"\r\n"));
        }
        assert_eq!(SensorCommand::StreamingMode.as_bytes(), b"K 1\r\n");
    }
}
