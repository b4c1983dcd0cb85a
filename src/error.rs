//! Error types for pdfelem.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfelem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting PDF elements.
#[derive(Error, Debug)]
pub enum Error {
    /// The source path is empty or does not point to an existing file.
    #[error("Cannot find the PDF file{}", describe_path(.0))]
    SourceNotFound(String),

    /// The output directory is missing and cannot be created, or is not a directory.
    #[error("Invalid destination directory: {0}")]
    DestinationInvalid(String),

    /// A single image or page could not be decoded.
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// A single output file could not be written.
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailure {
        /// File that was being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

fn describe_path(path: &str) -> String {
    if path.is_empty() {
        ", you have specified an empty path".to_string()
    } else {
        format!(" at \"{}\"", path)
    }
}

impl Error {
    /// Whether this error aborts a whole extraction run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::DecodeFailure(_) | Error::WriteFailure { .. } | Error::TextExtract(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::DecodeFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::SourceNotFound(String::new());
        assert_eq!(
            err.to_string(),
            "Cannot find the PDF file, you have specified an empty path"
        );

        let err = Error::SourceNotFound("/tmp/missing.pdf".into());
        assert_eq!(
            err.to_string(),
            "Cannot find the PDF file at \"/tmp/missing.pdf\""
        );
    }

    #[test]
    fn test_write_failure_display() {
        let err = Error::WriteFailure {
            path: PathBuf::from("out/text/page0.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("Failed to write out/text/page0.txt"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatality() {
        assert!(Error::SourceNotFound("x".into()).is_fatal());
        assert!(Error::DestinationInvalid("x".into()).is_fatal());
        assert!(!Error::DecodeFailure("bad".into()).is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
