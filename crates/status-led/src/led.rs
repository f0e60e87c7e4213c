//! LED output sinks

use crate::palette::Rgb;
use tracing::debug;

/// A single multi-colour LED
pub trait Led: Send {
    fn show(&mut self, colour: Rgb);
}

/// Host stand-in that logs colour changes
#[derive(Debug, Default)]
pub struct TraceLed {
    last: Option<Rgb>,
}

impl Led for TraceLed {
    fn show(&mut self, colour: Rgb) {
        if self.last != Some(colour) {
            debug!(target: "status_led", "LED -> #{:02x}{:02x}{:02x}", colour.r, colour.g, colour.b);
            self.last = Some(colour);
        }
    }
}
