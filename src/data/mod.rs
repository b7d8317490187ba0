//! Data sources.
//!
//! - deterministic synthetic epidemic sample (`sample`)

pub mod sample;

pub use sample::*;
