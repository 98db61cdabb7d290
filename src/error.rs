//! Error types for savescope.
//!
//! Per-file decode failures are carried as classifications inside
//! [`DecodeOutcome`](crate::container::DecodeOutcome); this type covers the
//! operations that hand back a `Result`.

use thiserror::Error;

/// Primary error type for savescope.
#[derive(Debug, Error)]
pub enum SaveScopeError {
    /// IO error while loading a sample file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The buffer is too small to contain a container header.
    #[error("File too small: expected at least {expected} bytes, got {actual}")]
    TooSmall { expected: usize, actual: usize },

    /// The container magic did not match.
    #[error("Invalid container magic: got {actual:02X?}")]
    BadMagic { actual: Vec<u8> },

    /// Header was valid but no payload recovery strategy succeeded.
    #[error("Unknown compression: tried {attempted}")]
    UnknownCompression { attempted: String },

    /// Corpus comparison needs more usable samples.
    #[error("Insufficient samples: need at least {required} usable files, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for savescope operations.
pub type Result<T> = std::result::Result<T, SaveScopeError>;
