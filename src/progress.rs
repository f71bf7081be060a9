//! Progress events emitted while a conversion runs
//!
//! The pipeline pushes every event synchronously into a [`ProgressSink`]
//! supplied by the caller. How the text gets shown (a status label, a log
//! line, nothing at all) is up to the sink.
//!
//! # Example
//!
//! ```
//! use images_to_pdf::progress::{ProgressEvent, ProgressSink};
//!
//! let mut lines = Vec::new();
//! let mut sink = |event: &ProgressEvent| lines.push(event.to_string());
//! sink.emit(&ProgressEvent::Found { total: 3 });
//! assert_eq!(lines, vec!["found 3 image(s)"]);
//! ```

use std::fmt;
use std::path::PathBuf;

/// A single status update from the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Directory scanned, `total` images will be processed
    Found { total: usize },
    /// Directory contains no supported images; nothing will be written
    NoImages { directory: PathBuf },
    /// About to process the `index`-th file (1-based)
    Processing {
        index: usize,
        total: usize,
        file: String,
    },
    /// File could not be turned into a page and was left out
    Skipped {
        index: usize,
        total: usize,
        file: String,
        reason: String,
    },
    /// Every file was skipped; nothing was written
    NoPages { attempted: usize },
    /// Document committed to `output`
    Saved { output: PathBuf, pages: usize },
    /// Run aborted by a fatal error
    Failed { reason: String },
}

impl ProgressEvent {
    /// True for the events that end a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::NoImages { .. }
                | ProgressEvent::NoPages { .. }
                | ProgressEvent::Saved { .. }
                | ProgressEvent::Failed { .. }
        )
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Found { total } => write!(f, "found {} image(s)", total),
            ProgressEvent::NoImages { directory } => {
                write!(f, "error: no images found in {}", directory.display())
            }
            ProgressEvent::Processing { index, total, file } => {
                write!(f, "({}/{}) processing {}", index, total, file)
            }
            ProgressEvent::Skipped {
                index,
                total,
                file,
                reason,
            } => write!(
                f,
                "warning: ({}/{}) skipped {} - {}",
                index, total, file, reason
            ),
            ProgressEvent::NoPages { attempted } => write!(
                f,
                "error: none of the {} image(s) could be converted, nothing written",
                attempted
            ),
            ProgressEvent::Saved { output, pages } => write!(
                f,
                "success: {} page(s) saved to {}",
                pages,
                output.display()
            ),
            ProgressEvent::Failed { reason } => write!(f, "conversion failed: {}", reason),
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink {
    fn emit(&mut self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressEvent),
{
    fn emit(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Keeps every event, mostly useful in tests
impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: &ProgressEvent) {
        self.push(event.clone());
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&mut self, _event: &ProgressEvent) {}
}
