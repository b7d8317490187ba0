//! Input/output helpers.
//!
//! - canonical CSV ingest + validation (`ingest`)
//! - population table CSV (`population`)
//! - matrix / model / canonical CSV exports (`export`)
//! - fitted-model JSON read/write (`model`)

pub mod export;
pub mod ingest;
pub mod model;
pub mod population;

pub use export::*;
pub use ingest::*;
pub use model::*;
pub use population::*;
