//! Error types for the `adk-vectorstore` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in vector store operations.
///
/// Malformed requests (`InvalidArgument`, `DimensionMismatch`) are raised
/// before any embedding or backend call is made. Collaborator failures
/// (`EmbeddingError`, `BackendError`) are passed through to the caller as
/// they were produced.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// The request shape is malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A vector's length disagrees with the store's dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality configured for the store.
        expected: usize,
        /// The length of the offending vector.
        actual: usize,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the backend index.
    #[error("Backend error ({backend}): {message}")]
    BackendError {
        /// The backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A search type that is neither `similarity` nor `mmr`.
    #[error("Unsupported search type '{0}': expected 'similarity' or 'mmr'")]
    UnsupportedSearchType(String),

    /// The backend index did not become ready within the polling budget.
    #[error("Backend index '{index}' not ready after {waited:?}")]
    BackendNotReady {
        /// The index that was polled.
        index: String,
        /// How long the poll waited before giving up.
        waited: Duration,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl VectorStoreError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn backend(backend: &str, message: impl Into<String>) -> Self {
        Self::BackendError { backend: backend.to_string(), message: message.into() }
    }
}

/// A convenience result type for vector store operations.
pub type Result<T> = std::result::Result<T, VectorStoreError>;
