//! Incremental construction of the output PDF using lopdf
//!
//! Pages are appended one image at a time. Nothing reaches the destination
//! path until [`ImageDocument::finish`]: the bytes go to a temp file in the
//! destination's directory, which is then renamed over the destination.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tempfile::NamedTempFile;

use crate::error::{Error, PageError, Result};
use crate::layout::{PageDimensions, Placement};
use crate::pdf::xobject::EmbeddedImage;

const PRODUCER: &str = concat!("images-to-pdf ", env!("CARGO_PKG_VERSION"));

/// A write-once PDF with one image per page
pub struct ImageDocument {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page: PageDimensions,
    output: PathBuf,
    staging: NamedTempFile,
}

impl ImageDocument {
    /// Start a document that will be committed to `output`
    ///
    /// The staging file is created right away, so an unwritable destination
    /// directory is reported before any image is decoded.
    pub fn create(output: &Path, page: PageDimensions) -> Result<Self> {
        let staging = staging_file(output).map_err(|source| Error::OutputWrite {
            path: output.to_path_buf(),
            source,
        })?;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        Ok(Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            page,
            output: output.to_path_buf(),
            staging,
        })
    }

    /// Number of pages drawn so far
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append a page showing `image` at `placement`
    ///
    /// All objects for the page are built before any is added, so a failure
    /// leaves the document exactly as it was.
    pub fn add_image_page(
        &mut self,
        file: &str,
        image: &EmbeddedImage,
        placement: &Placement,
    ) -> std::result::Result<ObjectId, PageError> {
        let encode_error = |source| PageError::Encode {
            file: file.to_string(),
            source,
        };

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(placement.width as f32),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(placement.height as f32),
                        Object::Real(placement.x as f32),
                        Object::Real(placement.y as f32),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content = content
            .encode()
            .map_err(|e| encode_error(io::Error::new(io::ErrorKind::Other, e.to_string())))?;

        let smask_id = image
            .soft_mask_stream()
            .map(|mask| self.doc.add_object(mask));
        let image_id = self.doc.add_object(image.xobject_stream(smask_id));
        let content_id = self.doc.add_object(lopdf::Stream::new(Dictionary::new(), content));

        let mut xobjects = Dictionary::new();
        xobjects.set("Im0", Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        page.set("MediaBox", media_box(&self.page));
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Reference(content_id));

        let page_id = self.doc.add_object(Object::Dictionary(page));
        self.page_ids.push(page_id);

        log::debug!(
            "page {}: {} at ({:.2}, {:.2}) size {:.2} x {:.2}",
            self.page_ids.len(),
            file,
            placement.x,
            placement.y,
            placement.width,
            placement.height
        );

        Ok(page_id)
    }

    /// Write the document and move it over the destination
    ///
    /// Consumes the document, so it can be committed at most once.
    pub fn finish(mut self) -> Result<PathBuf> {
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages.set("Kids", Object::Array(kids));
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut info = Dictionary::new();
        info.set("Producer", Object::string_literal(PRODUCER));
        info.set("CreationDate", Object::string_literal(pdf_date(chrono::Local::now())));
        let info_id = self.doc.add_object(Object::Dictionary(info));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        self.doc.compress();

        let output = self.output;
        let write_error = |source| Error::OutputWrite {
            path: output.clone(),
            source,
        };

        {
            let mut writer = BufWriter::new(self.staging.as_file_mut());
            self.doc
                .save_to(&mut writer)
                .map_err(|e| write_error(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
            writer.flush().map_err(write_error)?;
        }
        self.staging.as_file().sync_all().map_err(write_error)?;
        self.staging
            .persist(&output)
            .map_err(|e| write_error(e.error))?;

        log::info!("wrote {} page(s) to {}", self.page_ids.len(), output.display());
        Ok(output)
    }
}

/// Temp file beside `output`, created with the mode a plain `File::create`
/// would get so the committed PDF is not owner-only
fn staging_file(output: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".images-to-pdf-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // The process umask still applies
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(staging_dir(output))
}

fn staging_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn media_box(page: &PageDimensions) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(page.width.pt() as f32),
        Object::Real(page.height.pt() as f32),
    ])
}

/// Format a timestamp as a PDF date string, e.g. `D:20260118093000+01'00'`
fn pdf_date<Tz: chrono::TimeZone>(time: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let offset = time.format("%z").to_string();
    let (hours, minutes) = offset.split_at(offset.len().saturating_sub(2));
    format!("D:{}{}'{}'", time.format("%Y%m%d%H%M%S"), hours, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{fit_image, Margins, PageSize};
    use chrono::{FixedOffset, TimeZone};
    use image::{DynamicImage, RgbImage};
    use tempfile::TempDir;

    fn sample_image(width: u32, height: u32) -> EmbeddedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        EmbeddedImage::from_dynamic(&img).unwrap()
    }

    #[test]
    fn test_pages_are_committed_on_finish() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let output = dir.path().join("book.pdf");
        let page = PageSize::Letter.dimensions();

        let mut document = ImageDocument::create(&output, page).unwrap();
        for (w, h) in [(100, 100), (2000, 1000)] {
            let placement = fit_image(&page, &Margins::default(), w, h).unwrap();
            document
                .add_image_page("test.png", &sample_image(w, h), &placement)
                .unwrap();
        }
        assert_eq!(document.page_count(), 2);
        assert!(!output.exists(), "Nothing should be written before finish");

        let written = document.finish().expect("Failed to finish document");
        assert_eq!(written, output);

        let doc = Document::load(&output).expect("Failed to load output");
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_dropped_document_leaves_no_file() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let output = dir.path().join("abandoned.pdf");

        let document = ImageDocument::create(&output, PageSize::A4.dimensions()).unwrap();
        drop(document);

        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_in_missing_directory_is_output_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let output = dir.path().join("missing").join("out.pdf");

        let result = ImageDocument::create(&output, PageSize::A4.dimensions());
        assert!(matches!(result, Err(Error::OutputWrite { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_mode_matches_plain_create() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create temp directory");
        let output = dir.path().join("shared.pdf");
        let page = PageSize::A4.dimensions();

        let mut document = ImageDocument::create(&output, page).unwrap();
        let placement = fit_image(&page, &Margins::default(), 4, 4).unwrap();
        document
            .add_image_page("tiny.png", &sample_image(4, 4), &placement)
            .unwrap();
        document.finish().expect("Failed to finish document");

        let reference = dir.path().join("reference.txt");
        std::fs::write(&reference, b"x").unwrap();

        let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&output), mode(&reference));
    }

    #[test]
    fn test_staging_dir_for_bare_file_name() {
        assert_eq!(staging_dir(Path::new("out.pdf")), Path::new("."));
        assert_eq!(staging_dir(Path::new("a/out.pdf")), Path::new("a"));
    }

    #[test]
    fn test_pdf_date_format() {
        let offset = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let time = offset.with_ymd_and_hms(2026, 1, 18, 9, 30, 0).unwrap();
        assert_eq!(pdf_date(time), "D:20260118093000+05'30'");
    }
}
