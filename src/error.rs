//! Error types.
//!
//! Two layers:
//!
//! - [`EngineError`] is returned by the computation modules when a *request* is
//!   malformed (unknown variable, bad window, missing population entry).
//!   Missing *data* is never an error; it travels as `None` cells or absent
//!   model rows.
//! - [`AppError`] is what the binary reports. It carries the process exit code.

use thiserror::Error;

/// Typed failures of the growth engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown variable `{0}` (not part of the canonical schema)")]
    UnknownVariable(String),
    #[error("invalid window {window}: must be >= {min}")]
    InvalidWindow { window: usize, min: usize },
    #[error("no population entry for location `{0}`")]
    MissingPopulation(String),
    #[error("at least one location must be requested")]
    EmptyLocations,
}

impl EngineError {
    /// Validate a window against a lower bound.
    pub fn check_window(window: usize, min: usize) -> Result<(), EngineError> {
        if window < min {
            return Err(EngineError::InvalidWindow { window, min });
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let exit_code = match err {
            EngineError::MissingPopulation(_) => 3,
            EngineError::UnknownVariable(_) | EngineError::InvalidWindow { .. } | EngineError::EmptyLocations => 2,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_check_reports_bound() {
        assert!(EngineError::check_window(2, 2).is_ok());
        assert_eq!(
            EngineError::check_window(1, 2),
            Err(EngineError::InvalidWindow { window: 1, min: 2 })
        );
    }

    #[test]
    fn engine_errors_map_to_exit_codes() {
        let app: AppError = EngineError::UnknownVariable("foo".to_string()).into();
        assert_eq!(app.exit_code(), 2);
        assert!(app.to_string().contains("foo"));

        let app: AppError = EngineError::MissingPopulation("Atlantis".to_string()).into();
        assert_eq!(app.exit_code(), 3);
    }
}
