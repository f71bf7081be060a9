//! Page geometry: sizes, margins and image placement

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Length in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from points
    pub fn from_pt(pt: f64) -> Self {
        Length(pt)
    }

    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm * 72.0 / 25.4)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 72.0)
    }

    /// Get the value in points
    pub fn pt(&self) -> f64 {
        self.0
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0 * 25.4 / 72.0
    }
}

/// Fixed inset between every page edge and the drawn image
pub const PAGE_MARGIN: Length = Length(20.0);

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_inches(8.5),
            height: Length::from_inches(11.0),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Width and height left for content once the margins are taken out
    pub fn drawable_area(&self, page: &PageDimensions) -> (f64, f64) {
        (
            page.width.pt() - self.left.pt() - self.right.pt(),
            page.height.pt() - self.top.pt() - self.bottom.pt(),
        )
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(PAGE_MARGIN)
    }
}

/// Page size selected once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    Letter,
    A4,
}

impl PageSize {
    pub fn dimensions(self) -> PageDimensions {
        match self {
            PageSize::Letter => PageDimensions::letter(),
            PageSize::A4 => PageDimensions::a4(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageSize::Letter => "letter",
            PageSize::A4 => "a4",
        }
    }

    /// Resolve a page size name, falling back to Letter
    ///
    /// Only a case-insensitive "a4" selects A4. Anything else, including
    /// garbage, selects Letter; values other than "letter" are logged.
    pub fn from_name_lossy(name: &str) -> Self {
        match name.parse() {
            Ok(size) => size,
            Err(_) => {
                log::warn!("unrecognised page size '{}', using letter", name);
                PageSize::Letter
            }
        }
    }
}

impl FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("a4") {
            Ok(PageSize::A4)
        } else if name.eq_ignore_ascii_case("letter") {
            Ok(PageSize::Letter)
        } else {
            Err(Error::InvalidPageSize(s.to_string()))
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an image lands on its page, in points from the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Ratio of drawn size to pixel size, never above 1
    pub scale: f64,
}

/// Scale an image to fit inside the margins and center it on the page
///
/// The aspect ratio is preserved and the image is never enlarged past one
/// point per pixel. Returns `None` for images with a zero dimension.
pub fn fit_image(
    page: &PageDimensions,
    margins: &Margins,
    image_width: u32,
    image_height: u32,
) -> Option<Placement> {
    if image_width == 0 || image_height == 0 {
        return None;
    }

    let (img_w, img_h) = (f64::from(image_width), f64::from(image_height));
    let (max_w, max_h) = margins.drawable_area(page);

    let scale = (max_w / img_w).min(max_h / img_h).min(1.0);
    let width = img_w * scale;
    let height = img_h * scale;

    Some(Placement {
        x: (page.width.pt() - width) / 2.0,
        y: (page.height.pt() - height) / 2.0,
        width,
        height,
        scale,
    })
}
