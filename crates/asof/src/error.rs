//! Error types for the reader facade.

use asof_data::DataError;
use asof_factors::FactorError;
use thiserror::Error;

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors raised by the reader facade and its configuration.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Factor construction or query failed
    #[error(transparent)]
    Factor(#[from] FactorError),

    /// Store failure
    #[error(transparent)]
    Data(#[from] DataError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cache lock was poisoned by a panicking initializer
    #[error("Cache lock poisoned")]
    LockPoisoned,
}
