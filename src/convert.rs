//! Conversion pipeline entry points
//!
//! A run lists the source directory in natural order, then composes one page
//! per image. Every run gets its own parameters and its own output document;
//! nothing is kept between runs.

use std::path::{Path, PathBuf};

use crate::compose::{compose_pages, CompletionStatus};
use crate::error::Result;
use crate::layout::PageSize;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::sequence::list_images;

/// Parameters for one conversion run
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Directory holding the source images
    pub source_dir: PathBuf,
    /// Where the PDF is written; missing parent directories are created
    pub output_path: PathBuf,
    /// Page size applied to every page
    pub page_size: PageSize,
}

impl ConvertOptions {
    /// Options with the default (Letter) page size
    pub fn new(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            page_size: PageSize::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Convert every supported image in `options.source_dir` into one PDF
///
/// Fatal errors are reported to `progress` as [`ProgressEvent::Failed`] and
/// then returned. A missing or unreadable source directory fails before any
/// file is processed.
///
/// # Example
///
/// ```no_run
/// use images_to_pdf::{convert_images, ConvertOptions, PageSize};
///
/// let options = ConvertOptions::new("scans", "out/scans.pdf").with_page_size(PageSize::A4);
/// let mut print = |event: &images_to_pdf::ProgressEvent| println!("{}", event);
///
/// convert_images(&options, &mut print).expect("Failed to convert");
/// ```
pub fn convert_images(
    options: &ConvertOptions,
    progress: &mut dyn ProgressSink,
) -> Result<CompletionStatus> {
    log::info!(
        "converting {} to {} ({})",
        options.source_dir.display(),
        options.output_path.display(),
        options.page_size
    );

    let result = run(options, progress);

    if let Err(err) = &result {
        log::error!("conversion failed: {}", err);
        progress.emit(&ProgressEvent::Failed {
            reason: err.to_string(),
        });
    }
    result
}

fn run(options: &ConvertOptions, progress: &mut dyn ProgressSink) -> Result<CompletionStatus> {
    let files = list_images(&options.source_dir)?;
    if !files.is_empty() {
        progress.emit(&ProgressEvent::Found { total: files.len() });
    }
    compose_pages(
        &options.source_dir,
        &files,
        &options.output_path,
        options.page_size,
        progress,
    )
}

/// String-level entry point for presentation layers
///
/// `page_size` is matched case-insensitively; anything other than "a4"
/// selects Letter. Each progress event reaches `on_progress` as its display
/// text.
pub fn convert<F>(
    source_directory: &Path,
    destination_path: &Path,
    page_size: &str,
    mut on_progress: F,
) -> Result<CompletionStatus>
where
    F: FnMut(&str),
{
    let options = ConvertOptions::new(source_directory, destination_path)
        .with_page_size(PageSize::from_name_lossy(page_size));

    let mut sink = |event: &ProgressEvent| on_progress(&event.to_string());
    convert_images(&options, &mut sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_options_builder() {
        let options = ConvertOptions::new("in", "out.pdf");
        assert_eq!(options.page_size, PageSize::Letter);

        let options = options.with_page_size(PageSize::A4);
        assert_eq!(options.page_size, PageSize::A4);
        assert_eq!(options.source_dir, PathBuf::from("in"));
    }

    #[test]
    fn test_missing_directory_reports_failure_only() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let options = ConvertOptions::new(dir.path().join("nope"), dir.path().join("out.pdf"));
        let mut events: Vec<ProgressEvent> = Vec::new();

        let err = convert_images(&options, &mut events).unwrap_err();

        assert!(matches!(err, Error::Directory { .. }));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProgressEvent::Failed { .. }));
    }

    #[test]
    fn test_string_entry_point_reports_text() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut messages = Vec::new();

        let status = convert(
            dir.path(),
            &dir.path().join("out.pdf"),
            "whatever",
            |msg: &str| messages.push(msg.to_string()),
        )
        .unwrap();

        assert!(status.is_empty());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("no images found"));
    }
}
