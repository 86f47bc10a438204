//! Error types for cycle identifiers.

use thiserror::Error;

/// Result type alias using CycleError.
pub type CycleResult<T> = Result<T, CycleError>;

/// Errors raised while constructing a forecast cycle identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("Invalid cycle date '{0}': expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Invalid cycle hour '{0}': expected 00-23")]
    InvalidHour(String),
}
