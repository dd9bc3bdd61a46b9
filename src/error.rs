//! Error types for the block codec.

use std::io;
use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by extraction and reconstruction.
///
/// Validation never fails with an error: violations are reported through
/// [`ValidationReport`](crate::ValidationReport).
#[derive(Error, Debug)]
pub enum Error {
    /// The package is not a usable word-processing document.
    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The package archive could not be read or written.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Markup could not be parsed or serialized.
    #[error("XML error: {0}")]
    Xml(String),

    /// A document could not be (de)serialized as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file is unreadable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        Error::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFormat("missing word/document.xml".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid document format: missing word/document.xml"
        );

        let err = Error::xml("unexpected end of input");
        assert_eq!(err.to_string(), "XML error: unexpected end of input");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
