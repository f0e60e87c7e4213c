//! Sample Filtering
//!
//! Reduces the high-rate reading stream to averaged samples.

mod window;

pub use window::{AveragingWindow, AVG_WINDOW};
