//! Error types for range-picker operations.

use thiserror::Error;

use crate::controller::Phase;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Nonexistent local time: {0}")]
    NonexistentLocalTime(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid zone: {0}")]
    InvalidZone(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Range cannot be applied while {phase}")]
    NotApplicable { phase: Phase },
}

pub type Result<T> = std::result::Result<T, RangeError>;
