//! Source file validation and PDF header sniffing.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF format information read from the file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;

/// Validate that `path` names an existing PDF file.
///
/// An empty path or a path that does not exist is reported as
/// [`Error::SourceNotFound`]; a file without a PDF header as
/// [`Error::UnknownFormat`].
pub fn validate_source<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let path = path.as_ref();
    let display = path.to_string_lossy().to_string();

    if display.trim().is_empty() {
        return Err(Error::SourceNotFound(String::new()));
    }
    if !path.is_file() {
        return Err(Error::SourceNotFound(display));
    }

    let mut header = Vec::with_capacity(16);
    File::open(path)?.take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the PDF version from the leading bytes of a file.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC.len() + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let raw = &data[PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN];
    let version = String::from_utf8_lossy(raw).to_string();

    match raw {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(PdfFormat { version })
        }
        _ => Err(Error::UnsupportedVersion(version)),
    }
}

/// Check if a file is a readable PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    validate_source(path).is_ok()
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
