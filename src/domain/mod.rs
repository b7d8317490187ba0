//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - the typed canonical schema (`Field`, `MetricFamily`, `Measure`, `Scale`)
//! - long-format observations and canonical records (`Observation`, `CanonicalTable`)
//! - aligned outputs (`AlignedMatrix`, `Series`) and fit outputs (`GrowthModel`)
//! - the selectable computations (`MetricRequest`) and run configuration

pub mod matrix;
pub mod metric;
pub mod model;
pub mod table;
pub mod types;

pub use matrix::*;
pub use metric::*;
pub use model::*;
pub use table::*;
pub use types::*;
