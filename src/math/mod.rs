//! Mathematical utilities: least squares and division guards.

pub mod guard;
pub mod ols;

pub use guard::*;
pub use ols::*;
