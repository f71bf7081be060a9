//! Error types for the images-to-pdf library
//!
//! [`Error`] is fatal and aborts a conversion run. [`PageError`] belongs to a
//! single source image; the compositor reports it and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a whole conversion run
#[derive(Error, Debug)]
pub enum Error {
    /// Source directory is missing or cannot be listed
    #[error("cannot read image directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination cannot be created or written
    #[error("cannot write output {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unrecognised page size name
    #[error("unknown page size '{0}' (expected 'letter' or 'a4')")]
    InvalidPageSize(String),

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for [`Error::Directory`]
    pub fn is_directory_error(&self) -> bool {
        matches!(self, Error::Directory { .. })
    }

    /// True for [`Error::OutputWrite`]
    pub fn is_output_error(&self) -> bool {
        matches!(self, Error::OutputWrite { .. })
    }
}

/// Failure to turn one source image into a page
///
/// Messages leave out the file name; callers pair them with [`PageError::file`].
#[derive(Error, Debug)]
pub enum PageError {
    #[error("failed to decode: {source}")]
    Decode {
        file: String,
        #[source]
        source: image::ImageError,
    },

    #[error("zero width or height")]
    EmptyImage { file: String },

    #[error("failed to encode: {source}")]
    Encode {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl PageError {
    /// Name of the source file this error belongs to
    pub fn file(&self) -> &str {
        match self {
            PageError::Decode { file, .. }
            | PageError::EmptyImage { file }
            | PageError::Encode { file, .. } => file,
        }
    }
}
