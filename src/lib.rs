//! `epi-growth` library crate.
//!
//! The binary (`epi`) is a thin wrapper around this library so that:
//!
//! - the growth engine is testable without spawning processes
//! - plotting or notebook front-ends can reuse the same matrices and models
//! - code stays easy to navigate as the project grows

pub mod align;
pub mod app;
pub mod cli;
pub mod data;
pub mod dataset;
pub mod derive;
pub mod domain;
pub mod error;
pub mod fit;
pub mod growth;
pub mod io;
pub mod logging;
pub mod math;
pub mod population;
pub mod report;
