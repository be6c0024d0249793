//! Error types for deck generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting, generating, editing or exporting a deck.
///
/// Every variant carries a message that is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input file or image is of a type we cannot handle.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The document could not be decoded or contained too little text.
    #[error("Document is empty or unreadable: {0}")]
    EmptyOrUnreadable(String),

    /// The generation service credential is not configured.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// The generation service failed or returned a response of the wrong shape.
    #[error("Content generation failed: {0}")]
    GenerationFailed(String),

    /// The presentation file could not be written.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Anything not anticipated above.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// The discriminant of this error, without its message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::EmptyOrUnreadable(_) => ErrorKind::EmptyOrUnreadable,
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::GenerationFailed(_) => ErrorKind::GenerationFailed,
            Self::ExportFailed(_) => ErrorKind::ExportFailed,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Unexpected(format!("I/O error: {}", e))
    }
}

/// Closed set of error kinds, used where only the category matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    UnsupportedFormat,
    EmptyOrUnreadable,
    MissingCredential,
    GenerationFailed,
    ExportFailed,
    Unexpected,
}
