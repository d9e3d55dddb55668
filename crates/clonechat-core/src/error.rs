//! Error types for Clone Chat.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("{0} timed out after {1}s")]
    Timeout(&'static str, u64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// The two failure shapes a caller of the gateway can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was unusable. Nothing external was called.
    Validation,
    /// Retrieval or generation failed. Details stay in the server log.
    Upstream,
}

impl Error {
    /// Classify this error for the caller-facing boundary.
    ///
    /// Only `Validation` is the caller's fault; everything else means the
    /// request could not be served and is reported generically.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Upstream,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
