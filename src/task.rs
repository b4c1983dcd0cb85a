//! Running an extraction off the calling thread.
//!
//! The worker owns the document for the whole run and reports progress over
//! a channel, so an interactive front end can keep drawing while pages are
//! processed.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, TryRecvError};

use crate::error::{Error, Result};
use crate::extract::{extract_file_with_progress, ExtractOptions, ExtractionEvent, ExtractionResult};

/// Handle to an extraction running on a background thread.
pub struct ExtractionTask {
    events: Receiver<ExtractionEvent>,
    handle: JoinHandle<Result<ExtractionResult>>,
}

/// Start extracting `source` into `dest` on a new worker thread.
///
/// Fails only if the thread cannot be spawned; errors from the extraction
/// itself are returned by [`ExtractionTask::wait`].
pub fn spawn_extraction<P, Q>(source: P, dest: Q, options: ExtractOptions) -> Result<ExtractionTask>
where
    P: Into<PathBuf>,
    Q: Into<PathBuf>,
{
    let source = source.into();
    let dest = dest.into();
    let (tx, rx) = unbounded();

    let handle = thread::Builder::new()
        .name("pdfelem-extract".to_string())
        .spawn(move || {
            extract_file_with_progress(&source, &dest, &options, |event| {
                // receiver gone means nobody is listening; keep going
                let _ = tx.send(event);
            })
        })?;

    Ok(ExtractionTask { events: rx, handle })
}

impl ExtractionTask {
    /// Blocking iterator over progress events; ends when the worker finishes.
    pub fn events(&self) -> crossbeam_channel::Iter<'_, ExtractionEvent> {
        self.events.iter()
    }

    /// The raw event receiver, for use with `select!`.
    pub fn receiver(&self) -> &Receiver<ExtractionEvent> {
        &self.events
    }

    /// Next event if one is ready.
    ///
    /// Returns `None` both when nothing is pending and when the worker is done.
    pub fn try_event(&self) -> Option<ExtractionEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and return its result.
    pub fn wait(self) -> Result<ExtractionResult> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(Error::Other(format!("extraction thread panicked: {}", message)))
            }
        }
    }
}

/// Run [`extract_file`](crate::extract_file) on tokio's blocking pool.
#[cfg(feature = "async")]
pub async fn extract_file_async<P, Q>(source: P, dest: Q, options: ExtractOptions) -> Result<ExtractionResult>
where
    P: Into<PathBuf>,
    Q: Into<PathBuf>,
{
    let source = source.into();
    let dest = dest.into();
    tokio::task::spawn_blocking(move || crate::extract::extract_file(&source, &dest, &options))
        .await
        .map_err(|e| Error::Other(format!("extraction task failed: {}", e)))?
}
