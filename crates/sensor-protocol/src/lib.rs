//! CO2 Sensor Protocol Implementation
//!
//! This crate provides async serial communication with SprintIR-style
//! CO2 sensors. The sensor streams newline-terminated text records such as
//! `Z 00421`; this crate frames them into lines and extracts the readings.

mod command;
mod error;
mod line;
mod link;
mod mock;
mod record;

pub use command::{SensorCommand, DEFAULT_BAUD_RATE};
pub use error::SensorError;
pub use line::{LineParser, MAX_LINE_LEN};
pub use link::SensorLink;
pub use record::{parse_sample, SAMPLE_MARKER};
