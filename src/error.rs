//! Error types for anno-prior.

use thiserror::Error;

/// Result type for anno-prior operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for anno-prior operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A token position outside the document was addressed.
    #[error("Position {position} out of range for document of length {len}")]
    PositionOutOfRange {
        /// The offending position.
        position: usize,
        /// Document length.
        len: usize,
    },

    /// A label sequence does not line up with the document.
    #[error("Length mismatch: expected {expected} labels, got {actual}")]
    LengthMismatch {
        /// Document length.
        expected: usize,
        /// Length of the sequence supplied.
        actual: usize,
    },

    /// The old label asserted by the caller is not the label the index last saw.
    #[error("Stale label at position {position}: index holds {expected}, caller asserted {actual}")]
    StaleLabel {
        /// Position being edited.
        position: usize,
        /// Label the index holds for that position.
        expected: usize,
        /// Label the caller claimed the position held.
        actual: usize,
    },

    /// The entity index violated one of its structural invariants.
    #[error("Inconsistent entity index: {0}")]
    Inconsistent(String),

    /// A label name that is not part of the label inventory.
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid prior configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an inconsistency error.
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Error::Inconsistent(msg.into())
    }

    /// Create an unknown label error.
    pub fn unknown_label(label: impl Into<String>) -> Self {
        Error::UnknownLabel(label.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
