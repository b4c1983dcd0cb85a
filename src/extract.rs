//! Extraction orchestration: open, chunk text, collect images, write.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::backend::{LopdfBackend, PdfBackend};
use crate::chunk::extract_chunks;
use crate::cleanup::{CleanupOptions, CleanupPipeline, CleanupPreset};
use crate::collect::collect_range;
use crate::error::{Error, Result};
use crate::range::{PageRange, PageRequest};
use crate::sink::FileSink;

/// What to extract from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Text chunks and images
    #[default]
    Full,
    /// Text chunks only
    TextOnly,
    /// Images only
    ImagesOnly,
}

impl ExtractMode {
    /// Whether text chunks are written.
    pub fn includes_text(self) -> bool {
        !matches!(self, ExtractMode::ImagesOnly)
    }

    /// Whether images are written.
    pub fn includes_images(self) -> bool {
        !matches!(self, ExtractMode::TextOnly)
    }
}

/// Options for an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum number of pages whose text goes into one file
    pub pages_per_chunk: u32,

    /// Pages to extract, clamped to the document
    pub pages: PageRequest,

    /// What to extract
    pub mode: ExtractMode,

    /// Encode and write images on the rayon pool
    pub parallel: bool,

    /// Cleanup applied to text before writing (`None` writes raw text)
    pub cleanup: Option<CleanupOptions>,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Group the text of `every` pages into one file.
    pub fn with_pages_per_chunk(mut self, every: u32) -> Self {
        self.pages_per_chunk = every.max(1);
        self
    }

    /// Set the requested page interval.
    pub fn with_pages(mut self, pages: PageRequest) -> Self {
        self.pages = pages;
        self
    }

    /// Request pages `from..=to`; out-of-range values are clamped later.
    pub fn with_page_range(mut self, from: i64, to: i64) -> Self {
        self.pages = PageRequest::new(from, to);
        self
    }

    /// Set extract mode.
    pub fn with_mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.mode = ExtractMode::TextOnly;
        self
    }

    /// Extract images only.
    pub fn images_only(mut self) -> Self {
        self.mode = ExtractMode::ImagesOnly;
        self
    }

    /// Enable or disable parallel image writing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Write images one after another on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup_preset(mut self, preset: CleanupPreset) -> Self {
        self.cleanup = Some(CleanupOptions::from_preset(preset));
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages_per_chunk: 1,
            pages: PageRequest::ALL,
            mode: ExtractMode::Full,
            parallel: true,
            cleanup: None,
        }
    }
}

/// The item a [`Failure`] refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// A text chunk, by emission index
    TextChunk {
        /// Chunk index (also the `page<N>.txt` number)
        index: usize,
        /// Pages the chunk covers
        pages: PageRange,
    },
    /// An image, by collection index
    Image {
        /// Image index (also the `img<N>.png` number)
        index: usize,
        /// Page the image was found on
        source_page: u32,
    },
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::TextChunk { index, pages } => write!(f, "text chunk {} (pages {})", index, pages),
            Item::Image { index, source_page } => {
                write!(f, "image {} (page {})", index, source_page)
            }
        }
    }
}

/// An item that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Skipped item
    pub item: Item,
    /// Error message
    pub cause: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.cause)
    }
}

/// Progress notifications emitted while an extraction runs.
#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    /// The document is open and the work is planned.
    Started {
        /// Pages in the document
        page_count: u32,
        /// Clamped range, `None` for a document without pages
        page_range: Option<PageRange>,
        /// Number of text chunks that will be produced
        chunks: usize,
    },
    /// A text chunk was written.
    TextWritten {
        /// Chunk index
        index: usize,
        /// Absolute path
        path: PathBuf,
    },
    /// Images have been collected and are about to be written.
    ImagesCollected {
        /// Number of decoded images
        count: usize,
    },
    /// An image was written.
    ImageWritten {
        /// Image index
        index: usize,
        /// Absolute path
        path: PathBuf,
    },
    /// An item was skipped.
    ItemFailed(Failure),
    /// Everything has been written.
    Finished {
        /// Text files written
        text_files: usize,
        /// Image files written
        image_files: usize,
        /// Items skipped
        failures: usize,
    },
}

/// Outcome of an extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Source PDF, when extracted from a file
    pub source: Option<PathBuf>,
    /// Absolute output directory
    pub destination: PathBuf,
    /// Pages in the document
    pub page_count: u32,
    /// Pages that were processed
    pub page_range: Option<PageRange>,
    /// Written text files, in chunk order
    pub text_paths: Vec<PathBuf>,
    /// Written image files, in collection order
    pub image_paths: Vec<PathBuf>,
    /// Skipped items, in the order they were encountered
    pub failures: Vec<Failure>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl ExtractionResult {
    /// Whether every planned item was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Serialize the result as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))
    }
}

/// Extract from an already opened document into `dest`.
///
/// The backend is consumed and dropped before this returns, whether the run
/// succeeds or not. Only an unusable destination is reported as an error;
/// per-item failures end up in [`ExtractionResult::failures`].
pub fn extract_document<B, P>(backend: B, dest: P, options: &ExtractOptions) -> Result<ExtractionResult>
where
    B: PdfBackend,
    P: AsRef<Path>,
{
    extract_document_with_progress(backend, dest, options, |_| {})
}

/// Like [`extract_document`], reporting progress to `on_event`.
pub fn extract_document_with_progress<B, P, F>(
    backend: B,
    dest: P,
    options: &ExtractOptions,
    mut on_event: F,
) -> Result<ExtractionResult>
where
    B: PdfBackend,
    P: AsRef<Path>,
    F: FnMut(ExtractionEvent),
{
    let started_at = Utc::now();
    let sink = FileSink::new(dest)?;

    let page_count = backend.page_count();
    let page_range = options.pages.resolve(page_count);
    let every = options.pages_per_chunk.max(1);

    let mut result = ExtractionResult {
        source: None,
        destination: sink.root().to_path_buf(),
        page_count,
        page_range,
        text_paths: Vec::new(),
        image_paths: Vec::new(),
        failures: Vec::new(),
        started_at,
        finished_at: started_at,
    };

    let chunks = match (page_range, options.mode.includes_text()) {
        (Some(range), true) => crate::chunk::plan_chunks(range, every).len(),
        _ => 0,
    };
    on_event(ExtractionEvent::Started {
        page_count,
        page_range,
        chunks,
    });

    match page_range {
        Some(range) => {
            log::info!(
                "Extracting pages {} of {} into {}",
                range,
                page_count,
                sink.root().display()
            );
            if options.mode.includes_text() {
                write_text_chunks(&backend, &sink, range, every, options, &mut result, &mut on_event);
            }
            if options.mode.includes_images() {
                write_images(&backend, &sink, range, options, &mut result, &mut on_event);
            }
        }
        None => {
            log::warn!("Document has no pages, nothing to extract");
            if options.mode.includes_images() {
                if let Err(e) = sink.ensure_image_dir() {
                    log::warn!("Cannot create image directory: {}", e);
                }
            }
        }
    }

    drop(backend);

    result.finished_at = Utc::now();
    on_event(ExtractionEvent::Finished {
        text_files: result.text_paths.len(),
        image_files: result.image_paths.len(),
        failures: result.failures.len(),
    });
    log::info!(
        "Wrote {} text files and {} images ({} skipped)",
        result.text_paths.len(),
        result.image_paths.len(),
        result.failures.len()
    );
    Ok(result)
}

fn write_text_chunks<B: PdfBackend, F: FnMut(ExtractionEvent)>(
    backend: &B,
    sink: &FileSink,
    range: PageRange,
    every: u32,
    options: &ExtractOptions,
    result: &mut ExtractionResult,
    on_event: &mut F,
) {
    let pipeline = options.cleanup.clone().map(CleanupPipeline::new);

    for (index, chunk) in extract_chunks(backend, range, every, pipeline.as_ref())
        .into_iter()
        .enumerate()
    {
        let item = Item::TextChunk {
            index,
            pages: chunk.pages,
        };
        match chunk.content.and_then(|text| sink.write_text(index, &text)) {
            Ok(path) => {
                on_event(ExtractionEvent::TextWritten {
                    index,
                    path: path.clone(),
                });
                result.text_paths.push(path);
            }
            Err(e) => fail(result, on_event, item, e),
        }
    }
}

fn write_images<B: PdfBackend, F: FnMut(ExtractionEvent)>(
    backend: &B,
    sink: &FileSink,
    range: PageRange,
    options: &ExtractOptions,
    result: &mut ExtractionResult,
    on_event: &mut F,
) {
    // the directory is part of the output layout even for image-less documents
    if let Err(e) = sink.ensure_image_dir() {
        log::warn!("Cannot create image directory: {}", e);
    }

    let records = collect_range(backend, range);
    on_event(ExtractionEvent::ImagesCollected {
        count: records.len(),
    });

    let written: Vec<Result<PathBuf>> = if options.parallel {
        records
            .par_iter()
            .enumerate()
            .map(|(index, record)| sink.write_image(index, &record.image))
            .collect()
    } else {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| sink.write_image(index, &record.image))
            .collect()
    };

    for (index, (record, outcome)) in records.iter().zip(written).enumerate() {
        match outcome {
            Ok(path) => {
                on_event(ExtractionEvent::ImageWritten {
                    index,
                    path: path.clone(),
                });
                result.image_paths.push(path);
            }
            Err(e) => {
                let item = Item::Image {
                    index,
                    source_page: record.source_page,
                };
                fail(result, on_event, item, e);
            }
        }
    }
}

fn fail<F: FnMut(ExtractionEvent)>(
    result: &mut ExtractionResult,
    on_event: &mut F,
    item: Item,
    error: Error,
) {
    log::warn!("Skipping {}: {}", item, error);
    let failure = Failure {
        item,
        cause: error.to_string(),
    };
    on_event(ExtractionEvent::ItemFailed(failure.clone()));
    result.failures.push(failure);
}

/// Open `source` and extract it into `dest`.
///
/// A missing or unreadable source and an unusable destination are fatal;
/// everything else is recorded per item.
pub fn extract_file<P, Q>(source: P, dest: Q, options: &ExtractOptions) -> Result<ExtractionResult>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    extract_file_with_progress(source, dest, options, |_| {})
}

/// Like [`extract_file`], reporting progress to `on_event`.
pub fn extract_file_with_progress<P, Q, F>(
    source: P,
    dest: Q,
    options: &ExtractOptions,
    on_event: F,
) -> Result<ExtractionResult>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: FnMut(ExtractionEvent),
{
    let source = source.as_ref();
    let backend = LopdfBackend::open(source)?;
    log::info!(
        "Loaded {} (PDF {}, {} pages)",
        source.display(),
        backend.version(),
        backend.page_count()
    );

    let mut result = extract_document_with_progress(backend, dest, options, on_event)?;
    result.source = Some(source.to_path_buf());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .with_pages_per_chunk(5)
            .with_page_range(2, 9)
            .text_only()
            .sequential()
            .with_cleanup_preset(CleanupPreset::Minimal);

        assert_eq!(options.pages_per_chunk, 5);
        assert_eq!(options.pages, PageRequest::new(2, 9));
        assert_eq!(options.mode, ExtractMode::TextOnly);
        assert!(!options.parallel);
        assert_eq!(
            options.cleanup,
            Some(CleanupOptions::from_preset(CleanupPreset::Minimal))
        );
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.pages_per_chunk, 1);
        assert_eq!(options.pages, PageRequest::ALL);
        assert_eq!(options.mode, ExtractMode::Full);
        assert!(options.parallel);
        assert!(options.cleanup.is_none());
    }

    #[test]
    fn test_chunk_size_never_zero() {
        assert_eq!(ExtractOptions::new().with_pages_per_chunk(0).pages_per_chunk, 1);
    }

    #[test]
    fn test_mode_flags() {
        assert!(ExtractMode::Full.includes_text() && ExtractMode::Full.includes_images());
        assert!(!ExtractMode::TextOnly.includes_images());
        assert!(!ExtractMode::ImagesOnly.includes_text());
    }

    #[test]
    fn test_item_display() {
        let item = Item::TextChunk {
            index: 2,
            pages: PageRange::clamp(11, 15, 20).unwrap(),
        };
        assert_eq!(item.to_string(), "text chunk 2 (pages 11-15)");

        let failure = Failure {
            item: Item::Image {
                index: 0,
                source_page: 3,
            },
            cause: "disk full".into(),
        };
        assert_eq!(failure.to_string(), "image 0 (page 3): disk full");
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_file(dir.path().join("nope.pdf"), dir.path(), &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));

        let err = extract_file("", dir.path(), &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }
}
