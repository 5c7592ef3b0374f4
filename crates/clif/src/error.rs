//! Error types for decoding CLI files.

use thiserror::Error;

/// Errors that can occur while decoding a CLI file.
///
/// Every malformed-input condition is a [`DecodeError::Format`]; the only
/// other failure is the byte source itself being unavailable.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// I/O error acquiring or reading the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed, missing, or truncated content.
    #[error("format error in {declaration}: {message}")]
    Format {
        /// Declaration token or opcode name that failed (e.g. `$$UNITS`).
        declaration: String,
        /// What was wrong with it.
        message: String,
    },
}

impl DecodeError {
    /// Create a format error for the given declaration or opcode.
    pub fn format(declaration: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            declaration: declaration.into(),
            message: message.into(),
        }
    }

    /// Whether this is a format error (as opposed to an I/O failure).
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// The declaration or opcode name carried by a format error.
    pub fn declaration(&self) -> Option<&str> {
        match self {
            Self::Format { declaration, .. } => Some(declaration),
            Self::Io(_) => None,
        }
    }
}

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
