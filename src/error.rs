use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LinkGraphError>;

/// Errors raised by the link graph store, its codec and the CLI.
#[derive(Debug, Error)]
pub enum LinkGraphError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The stream is structurally broken; the enclosing load is aborted.
    #[error("corruption detected: {0}")]
    Corruption(String),
    /// A caller passed an id or value outside the valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The stream was written by a version this build cannot read.
    #[error("unsupported save version {found} (supported {min}..={max})")]
    UnsupportedVersion {
        /// Version found in the stream.
        found: u16,
        /// Oldest readable version.
        min: u16,
        /// Newest readable version.
        max: u16,
    },
    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LinkGraphError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        LinkGraphError::Corruption(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        LinkGraphError::InvalidArgument(msg.into())
    }

    /// Returns true for errors that abort a load as corrupt.
    pub fn is_corruption(&self) -> bool {
        matches!(self, LinkGraphError::Corruption(_))
    }
}
