//! PDF output and inspection

pub mod builder;
pub mod metadata;
pub mod xobject;

// Re-export commonly used items
pub use builder::ImageDocument;
pub use metadata::{count_pages, extract_metadata, PageInfo, PdfMetadata};
pub use xobject::{ColorSpace, EmbeddedImage, ImageFilter};
