//! Error types for the SVF library.

use thiserror::Error;

/// Main error type for SVF decode operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Magic bytes or a section tag did not match the expected value
    #[error("Invalid magic: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: String, found: String },

    /// A structural version assertion failed
    #[error("Unsupported {context} version: {found}")]
    UnsupportedVersion { context: &'static str, found: i64 },

    /// Buffer is truncated or an offset points past its end
    #[error("Unexpected end of buffer at offset {0}")]
    UnexpectedEof(usize),

    /// A varint continuation run exceeded 64 bits
    #[error("Malformed varint at offset {0}")]
    MalformedVarint(usize),

    /// Invalid data structure in the buffer
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// A geometry pack id string was not numeric after stripping ".pf"
    #[error("Non-numeric geometry pack id: {0:?}")]
    NonNumericPackId(String),

    /// One or more required property-database files are absent
    #[error("Missing property database resources: {0:?}")]
    MissingResources(Vec<String>),

    /// A property-graph walk revisited a node on its own path
    #[error("Cycle detected in property graph at dbId {0}")]
    CycleDetected(u32),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an invalid magic error from raw tag bytes.
    pub fn bad_magic(expected: &str, found: impl Into<String>) -> Self {
        Self::InvalidMagic {
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}

/// Result type alias for SVF decode operations.
pub type Result<T> = std::result::Result<T, Error>;
