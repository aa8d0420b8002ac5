//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading from a store.
#[derive(Debug, Error)]
pub enum DataError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Table does not exist in the store
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column does not exist in the table
    #[error("Unknown column {column} in table {table}")]
    UnknownColumn {
        /// Table that was queried
        table: String,
        /// Column that was requested
        column: String,
    },

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection lock was poisoned by a panicking reader
    #[error("Store connection lock poisoned")]
    LockPoisoned,
}
