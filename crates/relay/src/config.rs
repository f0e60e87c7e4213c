//! Relay configuration
//!
//! Loaded from an optional TOML file, overridden by `CO2_RELAY__*`
//! environment variables (e.g. `CO2_RELAY__UPLINK__ENDPOINT`).

use crate::error::RelayError;
use crate::pipeline::PipelineSettings;
use config::{Config, Environment, File, FileFormat};
use sensor_protocol::{SensorError, SensorLink, DEFAULT_BAUD_RATE};
use serde::Deserialize;
use status_led::Palette;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;
use uplink::{ConnectConfig, Url};

/// Config file looked up when none is given (any supported extension)
pub const DEFAULT_CONFIG_FILE: &str = "relay";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "CO2_RELAY";

/// Device name that selects the simulated sensor
pub const MOCK_DEVICE: &str = "mock";

/// Top-level relay configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub sensor: SensorConfig,
    pub uplink: UplinkConfig,
    pub status: StatusConfig,
    /// Consumer idle poll interval
    pub consumer_poll_ms: u64,
    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Prometheus listener address, e.g. "0.0.0.0:9000"
    pub metrics_listen: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sensor: SensorConfig::default(),
            uplink: UplinkConfig::default(),
            status: StatusConfig::default(),
            consumer_poll_ms: 5,
            log_level: "info".to_string(),
            metrics_listen: None,
        }
    }
}

/// Sensor link settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Serial device path, or "mock"
    pub device: String,
    pub baud_rate: u32,
    /// Interval between manual poll requests
    pub poll_interval_ms: u64,
    /// Pause between startup commands
    pub command_gap_ms: u64,
    /// Longest wait for sensor bytes before the producer ticks anyway
    pub read_tick_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval_ms: 1000,
            command_gap_ms: 100,
            read_tick_ms: 10,
        }
    }
}

impl SensorConfig {
    /// Open the configured sensor link
    pub fn open(&self) -> Result<SensorLink, SensorError> {
        let mut link = if self.device == MOCK_DEVICE {
            SensorLink::mock()
        } else {
            SensorLink::open(&self.device, self.baud_rate)?
        };
        link.set_command_gap(Duration::from_millis(self.command_gap_ms));
        Ok(link)
    }
}

/// Collector uplink settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    /// Collector endpoint receiving `POST text/plain`
    pub endpoint: String,
    pub transmit_timeout_ms: u64,
    /// Startup connection deadline before restarting
    pub connect_timeout_ms: u64,
    pub connect_poll_ms: u64,
    /// Bound on the link check made before each send
    pub link_check_timeout_ms: u64,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/co2_data".to_string(),
            transmit_timeout_ms: 5000,
            connect_timeout_ms: 20_000,
            connect_poll_ms: 500,
            link_check_timeout_ms: 1000,
        }
    }
}

impl UplinkConfig {
    /// Parsed endpoint URL
    pub fn endpoint_url(&self) -> Result<Url, RelayError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| RelayError::InvalidConfig(format!("endpoint {:?}: {}", self.endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidConfig(format!(
                "endpoint {:?} must be http or https",
                self.endpoint
            )));
        }
        Ok(url)
    }

    pub fn transmit_timeout(&self) -> Duration {
        Duration::from_millis(self.transmit_timeout_ms)
    }

    pub fn link_check_timeout(&self) -> Duration {
        Duration::from_millis(self.link_check_timeout_ms)
    }

    pub fn connect_config(&self) -> ConnectConfig {
        ConnectConfig {
            timeout: Duration::from_millis(self.connect_timeout_ms),
            poll_interval: Duration::from_millis(self.connect_poll_ms),
        }
    }
}

/// Status indicator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// How long a dropped batch is shown
    pub error_dwell_ms: u64,
    pub palette: Palette,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            error_dwell_ms: 1000,
            palette: Palette::default(),
        }
    }
}

impl StatusConfig {
    pub fn error_dwell(&self) -> Duration {
        Duration::from_millis(self.error_dwell_ms)
    }
}

impl RelayConfig {
    /// Load from `path` (or the default file, if present) plus environment
    pub fn load(path: Option<&str>) -> Result<Self, RelayError> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_FILE)).required(path.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_settings(settings)
    }

    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, RelayError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self, RelayError> {
        let config: RelayConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), RelayError> {
        let durations = [
            ("sensor.poll_interval_ms", self.sensor.poll_interval_ms),
            ("sensor.read_tick_ms", self.sensor.read_tick_ms),
            ("uplink.transmit_timeout_ms", self.uplink.transmit_timeout_ms),
            ("uplink.connect_timeout_ms", self.uplink.connect_timeout_ms),
            ("uplink.connect_poll_ms", self.uplink.connect_poll_ms),
            ("uplink.link_check_timeout_ms", self.uplink.link_check_timeout_ms),
            ("status.error_dwell_ms", self.status.error_dwell_ms),
            ("consumer_poll_ms", self.consumer_poll_ms),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(RelayError::InvalidConfig(format!("{} must be greater than zero", name)));
        }

        if self.sensor.baud_rate == 0 {
            return Err(RelayError::InvalidConfig("sensor.baud_rate must be greater than zero".to_string()));
        }

        self.uplink.endpoint_url()?;
        self.log_level()?;
        self.metrics_addr()?;
        Ok(())
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level, RelayError> {
        self.log_level
            .parse()
            .map_err(|_| RelayError::InvalidConfig(format!("unknown log level {:?}", self.log_level)))
    }

    /// Parsed metrics listener address
    pub fn metrics_addr(&self) -> Result<Option<SocketAddr>, RelayError> {
        self.metrics_listen
            .as_deref()
            .map(|addr| {
                addr.parse()
                    .map_err(|_| RelayError::InvalidConfig(format!("metrics_listen {:?} is not a socket address", addr)))
            })
            .transpose()
    }

    /// Timing for the producer and consumer loops
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            poll_interval: Duration::from_millis(self.sensor.poll_interval_ms),
            read_tick: Duration::from_millis(self.sensor.read_tick_ms),
            consumer_poll: Duration::from_millis(self.consumer_poll_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RelayConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sensor.baud_rate, 9600);
        assert_eq!(config.uplink.transmit_timeout(), Duration::from_secs(5));
        assert_eq!(config.uplink.connect_config().timeout, Duration::from_secs(20));
        assert_eq!(config.uplink.link_check_timeout(), Duration::from_secs(1));
        assert_eq!(config.status.error_dwell(), Duration::from_secs(1));
        assert_eq!(config.log_level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RelayConfig::from_toml(
            r#"
            log_level = "debug"
            metrics_listen = "127.0.0.1:9000"

            [sensor]
            device = "mock"

            [uplink]
            endpoint = "http://collector.local:8000/co2_data"

            [status.palette]
            waiting = { r = 0, g = 0, b = 8 }
            "#,
        )
        .unwrap();

        assert_eq!(config.sensor.device, MOCK_DEVICE);
        assert_eq!(config.sensor.poll_interval_ms, 1000);
        assert_eq!(config.uplink.endpoint_url().unwrap().host_str(), Some("collector.local"));
        assert_eq!(config.uplink.connect_timeout_ms, 20_000);
        assert_eq!(config.log_level().unwrap(), Level::DEBUG);
        assert_eq!(config.metrics_addr().unwrap(), Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(config.status.palette.waiting, status_led::Rgb::new(0, 0, 8));
        assert_eq!(config.status.palette.alert, Palette::default().alert);
    }

    #[test]
    fn test_rejects_bad_values() {
        for text in [
            "consumer_poll_ms = 0",
            "log_level = \"loud\"",
            "metrics_listen = \"nowhere\"",
            "[uplink]\nendpoint = \"not a url\"",
            "[uplink]\nendpoint = \"mqtt://broker/co2\"",
            "[sensor]\nbaud_rate = 0",
            "[uplink]\nlink_check_timeout_ms = 0",
        ] {
            assert!(
                matches!(RelayConfig::from_toml(text), Err(RelayError::InvalidConfig(_))),
                "accepted: {}",
                text
            );
        }
    }

    #[test]
    fn test_missing_default_file_is_allowed() {
        let config = RelayConfig::load(None).unwrap();
        assert_eq!(config.uplink.transmit_timeout_ms, 5000);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(matches!(
            RelayConfig::load(Some("does-not-exist.toml")),
            Err(RelayError::Config(_))
        ));
    }
}
