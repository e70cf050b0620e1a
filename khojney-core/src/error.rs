//! Error types for khojney-core

use thiserror::Error;

/// Main error type for the khojney-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The current session may not perform this operation
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Profile not found
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Category not found
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// Quiz attempt not found
    #[error("quiz attempt not found: {0}")]
    AttemptNotFound(String),

    /// Attempt was already completed and cannot be finished again
    #[error("quiz attempt already completed: {0}")]
    AttemptCompleted(String),

    /// Question rejected by validation
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// CSV bulk import failure, `line` is 1-based and counts the header
    #[error("import failed at line {line}: {message}")]
    Import { line: usize, message: String },

    /// Report date range is empty or reversed
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// Dashboard history filter value not recognised
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Parallel fetch task failed to complete
    #[error("fetch task failed: {0}")]
    Fetch(String),
}

/// Result type alias for khojney-core
pub type Result<T> = std::result::Result<T, Error>;
