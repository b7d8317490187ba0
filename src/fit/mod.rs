//! GeometricProcessFitter.
//!
//! Responsibilities:
//!
//! - slide a trailing calendar-day window over a series
//! - fit `ln v = P + R·k` to the usable points in each window (parallel)
//! - report skipped dates separately from fitted rows

pub mod fitter;

pub use fitter::*;
