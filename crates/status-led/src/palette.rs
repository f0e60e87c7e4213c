//! Colours and blink patterns

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// LED off
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// How a state is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Solid(Rgb),
    /// Alternates between the colour and off, starting lit
    Blink { colour: Rgb, half_period: Duration },
}

/// Colours used by the indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Boot and error colour
    pub alert: Rgb,
    /// Connecting
    pub connecting: Rgb,
    /// Idle, drawn dim
    pub waiting: Rgb,
    /// Sensor data arriving
    pub receiving: Rgb,
    /// Batch in flight
    pub sending: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            alert: Rgb::new(255, 0, 0),
            connecting: Rgb::new(0, 0, 255),
            waiting: Rgb::new(0, 24, 0),
            receiving: Rgb::new(0, 255, 0),
            sending: Rgb::new(255, 160, 0),
        }
    }
}
