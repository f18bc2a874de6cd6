//! Error types for the vecstore CLI.
//!
//! This module defines a unified error enum covering every error category
//! in the application: configuration, connectivity, schema lifecycle,
//! embedding computation, and store reads/writes.

use thiserror::Error;

/// Unified error type for the vecstore CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid model/schema parameters, detected before any
    /// network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend unreachable at client construction
    #[error("Connection error: {0}")]
    Connection(String),

    /// An index/collection for the model namespace already exists
    #[error("Schema already exists: {0}")]
    SchemaExists(String),

    /// No index/collection exists for the model namespace
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    /// Upstream embedding call failed or returned a degenerate vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Backend write failure
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// Malformed or unavailable index, or an unparseable reply
    #[error("Query error: {0}")]
    Query(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
