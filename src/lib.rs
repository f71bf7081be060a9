//! Images to PDF Library
//!
//! Turns a folder of raster images into a single PDF, one image per page.
//! This library provides functionality to:
//! - List the images of a directory in natural order ("page2" before "page10")
//! - Scale each image to fit a Letter or A4 page and center it
//! - Build the document incrementally, skipping files that fail to decode
//! - Report progress through an injected sink
//!
//! # Example
//!
//! ```no_run
//! use images_to_pdf::{convert_images, CompletionStatus, ConvertOptions, PageSize};
//!
//! let options = ConvertOptions::new("scans", "scans.pdf").with_page_size(PageSize::A4);
//! let mut log = |event: &images_to_pdf::ProgressEvent| eprintln!("{}", event);
//!
//! match convert_images(&options, &mut log).expect("Failed to convert") {
//!     CompletionStatus::Empty => eprintln!("nothing to do"),
//!     CompletionStatus::NoPages { skipped } => eprintln!("{} unreadable", skipped.len()),
//!     CompletionStatus::Completed(summary) => eprintln!("{} pages", summary.pages),
//! }
//! ```

pub mod compose;
pub mod convert;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod progress;
pub mod sequence;

// Re-export commonly used items
pub use compose::{compose_pages, CompletionStatus, ConversionSummary, SkippedImage};
pub use convert::{convert, convert_images, ConvertOptions};
pub use error::{Error, PageError, Result};
pub use layout::{fit_image, PageSize, Placement};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use sequence::list_images;
