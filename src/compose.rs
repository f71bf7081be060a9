//! Page compositor: one centered image per page
//!
//! Drives a conversion over an already ordered list of files. A file that
//! fails to decode is reported and left out; failures on the output side
//! abort the run.

use std::path::{Path, PathBuf};

use crate::error::{Error, PageError, Result};
use crate::layout::{fit_image, Margins, PageSize};
use crate::pdf::{EmbeddedImage, ImageDocument};
use crate::progress::{ProgressEvent, ProgressSink};

/// A source file that produced no page
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedImage {
    pub file: String,
    pub reason: String,
}

/// Outcome of a run that wrote a document
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub output: PathBuf,
    /// Pages written, one per successfully decoded image
    pub pages: usize,
    pub skipped: Vec<SkippedImage>,
}

/// How a conversion run ended, short of a fatal error
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionStatus {
    /// No supported images; no file was written
    Empty,
    /// Every image failed to convert; no file was written
    NoPages { skipped: Vec<SkippedImage> },
    /// Document written, possibly with some files skipped
    Completed(ConversionSummary),
}

impl CompletionStatus {
    pub fn is_empty(&self) -> bool {
        matches!(self, CompletionStatus::Empty)
    }

    /// Files left out of the run, whether or not a document was written
    pub fn skipped(&self) -> &[SkippedImage] {
        match self {
            CompletionStatus::Completed(summary) => &summary.skipped,
            CompletionStatus::NoPages { skipped } => skipped,
            CompletionStatus::Empty => &[],
        }
    }

    pub fn summary(&self) -> Option<&ConversionSummary> {
        match self {
            CompletionStatus::Completed(summary) => Some(summary),
            CompletionStatus::Empty | CompletionStatus::NoPages { .. } => None,
        }
    }
}

/// Render `files` (names inside `directory`, already in page order) into a
/// PDF at `destination`
///
/// The destination's parent directory is created if needed. An empty list
/// reports [`ProgressEvent::NoImages`] and returns
/// [`CompletionStatus::Empty`] without writing anything. If every file fails
/// the run reports [`ProgressEvent::NoPages`], returns
/// [`CompletionStatus::NoPages`] and writes nothing.
pub fn compose_pages(
    directory: &Path,
    files: &[String],
    destination: &Path,
    page_size: PageSize,
    progress: &mut dyn ProgressSink,
) -> Result<CompletionStatus> {
    ensure_parent_dir(destination)?;

    if files.is_empty() {
        progress.emit(&ProgressEvent::NoImages {
            directory: directory.to_path_buf(),
        });
        return Ok(CompletionStatus::Empty);
    }

    let page = page_size.dimensions();
    let margins = Margins::default();
    let mut document = ImageDocument::create(destination, page)?;

    let total = files.len();
    let mut skipped = Vec::new();

    for (i, file) in files.iter().enumerate() {
        progress.emit(&ProgressEvent::Processing {
            index: i + 1,
            total,
            file: file.clone(),
        });

        let drawn = EmbeddedImage::open(&directory.join(file)).and_then(|image| {
            let placement = fit_image(&page, &margins, image.width, image.height)
                .ok_or_else(|| PageError::EmptyImage { file: file.clone() })?;
            document.add_image_page(file, &image, &placement)
        });

        if let Err(err) = drawn {
            log::warn!("skipping {}: {}", file, err);
            let reason = err.to_string();
            progress.emit(&ProgressEvent::Skipped {
                index: i + 1,
                total,
                file: file.clone(),
                reason: reason.clone(),
            });
            skipped.push(SkippedImage {
                file: file.clone(),
                reason,
            });
        }
    }

    let pages = document.page_count();
    if pages == 0 {
        log::warn!("no page rendered from {} image(s)", total);
        progress.emit(&ProgressEvent::NoPages { attempted: total });
        return Ok(CompletionStatus::NoPages { skipped });
    }

    let output = document.finish()?;
    progress.emit(&ProgressEvent::Saved {
        output: output.clone(),
        pages,
    });

    Ok(CompletionStatus::Completed(ConversionSummary {
        output,
        pages,
        skipped,
    }))
}

/// Create the destination's parent directory; an existing one is fine
fn ensure_parent_dir(destination: &Path) -> Result<()> {
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| Error::OutputWrite {
                path: destination.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
