//! Error types for calendar and factor operations.

use asof_data::DataError;
use chrono::NaiveDate;
use thiserror::Error;

/// Result type for factor operations.
pub type Result<T> = std::result::Result<T, FactorError>;

/// Errors raised while building or querying factors.
///
/// Missing observations are never errors; they show up as empty cells.
#[derive(Debug, Error)]
pub enum FactorError {
    /// Unknown table or field, or a table of the wrong kind for the factor
    #[error("Schema error: {0}")]
    Schema(String),

    /// Query or calendar range with start after end
    #[error("Invalid date range: start {start} is after end {end}")]
    Range {
        /// Start date of the range
        start: NaiveDate,
        /// End date of the range
        end: NaiveDate,
    },

    /// Malformed or missing configuration (industry translation data)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid construction parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Declared variant without an implementation
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Trading calendar has no open days
    #[error("Trading calendar is empty")]
    EmptyCalendar,

    /// Store error
    #[error(transparent)]
    Data(#[from] DataError),
}
