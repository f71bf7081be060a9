//! Reading back what a produced PDF contains

use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Geometry of a single page
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    /// MediaBox width in points
    pub width: f64,
    /// MediaBox height in points
    pub height: f64,
    /// Rectangle (x, y, width, height) of the first image drawn on the page
    pub image_box: Option<(f64, f64, f64, f64)>,
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Per-page geometry, in page order
    pub pages: Vec<PageInfo>,
    /// Producer from the Info dictionary (if present)
    pub producer: Option<String>,
    /// Document title (if present)
    pub title: Option<String>,
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let doc = load(path)?;

    let mut pages = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let (width, height) = page_size(&doc, page_id)?;
        pages.push(PageInfo {
            width,
            height,
            image_box: image_box(&doc, page_id),
        });
    }

    Ok(PdfMetadata {
        page_count: pages.len(),
        pages,
        producer: info_string(&doc, b"Producer"),
        title: info_string(&doc, b"Title"),
    })
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    Ok(load(path)?.get_pages().len())
}

fn load(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )));
    }
    Ok(Document::load(path)?)
}

/// MediaBox of a page, inherited from the page tree when missing
fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64)> {
    let mut node = doc.get_dictionary(page_id)?;
    loop {
        if let Ok(media_box) = node.get(b"MediaBox").and_then(Object::as_array) {
            let values: Vec<f64> = media_box
                .iter()
                .filter_map(|v| v.as_float().ok())
                .map(f64::from)
                .collect();
            if let [x0, y0, x1, y1] = values[..] {
                return Ok(((x1 - x0).abs(), (y1 - y0).abs()));
            }
        }

        let parent = node.get(b"Parent").and_then(Object::as_reference)?;
        node = doc.get_dictionary(parent)?;
    }
}

/// Operands of the `cm` that precedes the first `Do` on the page
fn image_box(doc: &Document, page_id: ObjectId) -> Option<(f64, f64, f64, f64)> {
    let data = doc.get_page_content(page_id).ok()?;
    let content = Content::decode(&data).ok()?;

    let mut matrix = None;
    for op in &content.operations {
        match op.operator.as_str() {
            "cm" => {
                let values: Vec<f64> = op
                    .operands
                    .iter()
                    .filter_map(|v| v.as_float().ok())
                    .map(f64::from)
                    .collect();
                if values.len() == 6 {
                    matrix = Some((values[4], values[5], values[0], values[3]));
                }
            }
            "Do" => return matrix,
            _ => {}
        }
    }
    None
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    let bytes = info.get(key).and_then(Object::as_str).ok()?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
    }

    // Round trips through real documents live in tests/integration.rs
}
