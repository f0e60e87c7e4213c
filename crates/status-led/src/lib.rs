//! Status Indicator
//!
//! Reflects pipeline health on a single multi-colour LED.

mod indicator;
mod led;
mod palette;

pub use indicator::{next_state, render, LedState, PipelineView, StatusIndicator, Transition, DEFAULT_ERROR_DWELL};
pub use led::{Led, TraceLed};
pub use palette::{Palette, Pattern, Rgb};
