//! Common error types for slagmap

use thiserror::Error;

/// Common result type for slagmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the slagmap crates
#[derive(Error, Debug)]
pub enum Error {
    /// CaO + SiO2 + Al2O3 summed to zero, so there is nothing to normalize
    #[error("Zero total: CaO + SiO2 + Al2O3 must be greater than 0")]
    ZeroTotal,

    /// Invalid user input (empty name, malformed snapshot)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence read or write failed
    ///
    /// In-memory catalog state is left as-is when this is returned.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Operation not allowed in the current catalog state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors caused by the caller's input rather than infrastructure
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::ZeroTotal | Error::Validation(_))
    }
}
