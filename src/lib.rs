//! # pdfelem
//!
//! Extract the text and the raster images of a PDF document into a directory.
//!
//! Text is written in chunks of a configurable number of pages, images are
//! collected from every page (including the ones nested inside form
//! XObjects) and written as PNG files:
//!
//! ```text
//! <dest>/text/page0.txt, page1.txt, ...
//! <dest>/images/img0.png, img1.png, ...
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfelem::{extract_file, ExtractOptions};
//!
//! fn main() -> pdfelem::Result<()> {
//!     let options = ExtractOptions::new().with_pages_per_chunk(5);
//!     let result = extract_file("report.pdf", "report_output", &options)?;
//!
//!     println!("{} text files, {} images", result.text_paths.len(), result.image_paths.len());
//!     for failure in &result.failures {
//!         eprintln!("skipped {}", failure);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Page ranges**: out-of-range requests are clamped, never rejected
//! - **Nested images**: form XObjects are searched depth first
//! - **Partial failure**: a broken page or image is recorded and skipped
//! - **Background runs**: [`spawn_extraction`] reports progress over a channel
//! - **Cleanup pipeline**: optional Unicode and whitespace normalization

pub mod backend;
pub mod chunk;
pub mod cleanup;
pub mod collect;
pub mod decode;
pub mod error;
pub mod extract;
pub mod range;
pub mod sink;
pub mod source;
pub mod task;

// Re-export commonly used types
pub use backend::{LopdfBackend, PdfBackend, XObject};
pub use chunk::{extract_chunks, plan_chunks, TextChunk};
pub use cleanup::{clean_text, CleanupOptions, CleanupPipeline, CleanupPreset};
pub use collect::{collect_images, collect_page, collect_range, ImageRecord, MAX_FORM_DEPTH};
pub use decode::{decode_image, EncodedImage, ImageFilter};
pub use error::{Error, Result};
pub use extract::{
    extract_document, extract_document_with_progress, extract_file, extract_file_with_progress,
    ExtractMode, ExtractOptions, ExtractionEvent, ExtractionResult, Failure, Item,
};
pub use range::{PageRange, PageRequest};
pub use sink::FileSink;
pub use source::{detect_format_from_bytes, is_pdf, is_pdf_bytes, validate_source, PdfFormat};
pub use task::{spawn_extraction, ExtractionTask};

#[cfg(feature = "async")]
pub use task::extract_file_async;

use std::path::{Path, PathBuf};

/// Builder for extraction runs.
///
/// # Example
///
/// ```no_run
/// use pdfelem::Extractor;
///
/// let result = Extractor::new()
///     .every(10)
///     .pages(3, 40)
///     .text_only()
///     .extract("book.pdf", "book_output")?;
/// assert!(result.image_paths.is_empty());
/// # Ok::<(), pdfelem::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    /// Create a new Extractor builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put the text of `every` pages into each text file.
    pub fn every(mut self, every: u32) -> Self {
        self.options = self.options.with_pages_per_chunk(every);
        self
    }

    /// Restrict extraction to pages `from..=to` (`to = -1` for the last page).
    pub fn pages(mut self, from: i64, to: i64) -> Self {
        self.options = self.options.with_page_range(from, to);
        self
    }

    /// Set page request.
    pub fn with_pages(mut self, pages: PageRequest) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.options = self.options.text_only();
        self
    }

    /// Extract images only.
    pub fn images_only(mut self) -> Self {
        self.options = self.options.images_only();
        self
    }

    /// Disable parallel image writing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup(mut self, preset: CleanupPreset) -> Self {
        self.options = self.options.with_cleanup_preset(preset);
        self
    }

    /// The options built so far.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract `source` into `dest` on the calling thread.
    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        dest: Q,
    ) -> Result<ExtractionResult> {
        extract_file(source, dest, &self.options)
    }

    /// Extract an already opened document into `dest`.
    pub fn extract_document<B: PdfBackend, Q: AsRef<Path>>(
        &self,
        backend: B,
        dest: Q,
    ) -> Result<ExtractionResult> {
        extract_document(backend, dest, &self.options)
    }

    /// Start extracting `source` into `dest` on a background thread.
    pub fn spawn<P: Into<PathBuf>, Q: Into<PathBuf>>(
        self,
        source: P,
        dest: Q,
    ) -> Result<ExtractionTask> {
        spawn_extraction(source, dest, self.options)
    }
}
