//! Error types for the feedsift library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`SiftError`] enum.
//!
//! # Examples
//!
//! ```
//! use feedsift::error::{Result, SiftError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SiftError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for feedsift operations.
#[derive(Error, Debug)]
pub enum SiftError {
    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Text analysis errors (tokenization, vectorization)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Model training errors
    #[error("Training error: {0}")]
    Training(String),

    /// Model or embedding artifact errors (missing, corrupt, wrong version)
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Embedding provider errors (network/API failures)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SiftError.
pub type Result<T> = std::result::Result<T, SiftError>;

impl SiftError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        SiftError::Analysis(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        SiftError::Training(msg.into())
    }

    /// Create a new artifact error.
    pub fn artifact<S: Into<String>>(msg: S) -> Self {
        SiftError::Artifact(msg.into())
    }

    /// Create a new embedding provider error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        SiftError::Embedding(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SiftError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SiftError::Other(msg.into())
    }
}
