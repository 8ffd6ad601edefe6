//! Typed errors raised by the suitability engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A single raw record could not be converted. Callers drop the record
    /// and keep going.
    #[error("Malformed record: {field} {reason}")]
    MalformedRecord { field: &'static str, reason: String },

    /// Thresholds failed validation. Raised before any evaluation starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No hourly record exists for the current day.
    #[error("No hourly forecast available for {date}")]
    MissingHourlyFeed { date: NaiveDate },
}

impl EngineError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field,
            reason: reason.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
