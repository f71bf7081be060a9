//! Directory listing and natural ordering of image files

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{Error, Result};

/// Lowercase extensions accepted as source images
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Check a filename's extension against [`SUPPORTED_EXTENSIONS`], ignoring case
///
/// The extension is whatever follows the last dot, so a bare ".png" counts.
pub fn is_supported_image(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    /// Digit run with leading zeros stripped, so length orders magnitude
    Number(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(a), Segment::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Natural sort key: alternating text and number runs
///
/// The key always starts with a text run (possibly empty) so two keys line
/// up run-for-run. `"page10.png"` becomes `["page", 10, ".png"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey(Vec<Segment>);

impl SortKey {
    pub fn new(name: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut digits = String::new();

        for ch in name.chars() {
            if ch.is_ascii_digit() {
                if digits.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text).to_lowercase()));
                }
                digits.push(ch);
            } else {
                if !digits.is_empty() {
                    segments.push(number_segment(&digits));
                    digits.clear();
                }
                text.push(ch);
            }
        }

        if digits.is_empty() {
            segments.push(Segment::Text(text.to_lowercase()));
        } else {
            segments.push(number_segment(&digits));
            segments.push(Segment::Text(String::new()));
        }

        SortKey(segments)
    }
}

fn number_segment(digits: &str) -> Segment {
    let trimmed = digits.trim_start_matches('0');
    Segment::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// Compare two filenames in natural order
///
/// Names with equal keys (`"a01"` vs `"a1"`, `"A.png"` vs `"a.png"`) fall
/// back to a plain comparison so the result is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    SortKey::new(a).cmp(&SortKey::new(b)).then_with(|| a.cmp(b))
}

/// List the supported images in a directory, in natural order
///
/// Subdirectories are skipped even when their name looks like an image.
/// Fails with [`Error::Directory`] when the directory is missing or cannot
/// be listed, so an absent folder is never mistaken for an empty one.
pub fn list_images(directory: &Path) -> Result<Vec<String>> {
    let directory_error = |source| Error::Directory {
        path: directory.to_path_buf(),
        source,
    };

    let mut keyed = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(directory_error)? {
        let entry = entry.map_err(directory_error)?;

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                log::warn!("skipping non UTF-8 file name {:?}", raw);
                continue;
            }
        };

        if !is_supported_image(&name) || !entry.path().is_file() {
            continue;
        }

        keyed.push((SortKey::new(&name), name));
    }

    keyed.sort_by(|(ka, a), (kb, b)| ka.cmp(kb).then_with(|| a.cmp(b)));

    log::debug!("found {} image(s) in {}", keyed.len(), directory.display());
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}
