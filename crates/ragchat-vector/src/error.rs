//! Error types for ragchat-vector.

use thiserror::Error;

/// Result type for ragchat-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ragchat-vector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Dimension mismatch between a vector and the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Invalid vector (e.g., empty, contains NaN).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// The serialized blob could not be decoded.
    #[error("Corrupt index blob: {0}")]
    CorruptBlob(String),

    /// The serialized blob uses a format version this build does not know.
    #[error("Unsupported index format version {0}")]
    UnsupportedVersion(u8),
}
