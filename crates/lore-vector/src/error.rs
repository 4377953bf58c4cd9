//! Error types for lore-vector.

use thiserror::Error;

/// Result type for lore-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lore-vector operations.
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

    /// Invalid argument (e.g., `k == 0`, zero dimensions).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The stored snapshot is missing, unreadable, truncated, or
    /// incompatible with the expected format.
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// Persistence error while writing a snapshot.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
