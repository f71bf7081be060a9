//! Decoding source images into PDF image XObjects
//!
//! Gray and RGB JPEGs are embedded as they are, under `DCTDecode`. Everything
//! else is stored 8 bits per component, Flate-compressed: grayscale sources
//! stay `DeviceGray`, the rest becomes `DeviceRGB`, and an alpha channel is
//! split off into a soft mask.

use std::io::{Cursor, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use lopdf::{Dictionary, Object, Stream};

use crate::error::PageError;

/// Color space of the embedded pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
}

impl ColorSpace {
    /// Get the PDF name for this color space
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
        }
    }
}

/// How [`EmbeddedImage::data`] is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// Zlib-compressed raw pixels
    Flate,
    /// Baseline or progressive JPEG, stored untouched
    Dct,
}

impl ImageFilter {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ImageFilter::Flate => "FlateDecode",
            ImageFilter::Dct => "DCTDecode",
        }
    }
}

/// A decoded image ready to be placed on a page
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    pub color_space: ColorSpace,
    pub filter: ImageFilter,
    /// Pixel data, encoded as `filter` says
    pub data: Vec<u8>,
    /// Flate-compressed alpha channel, if the source had one
    pub soft_mask: Option<Vec<u8>>,
}

impl EmbeddedImage {
    /// Decode an image file
    ///
    /// The format is sniffed from the file content and falls back to the
    /// extension. Animated or multi-page sources yield their first frame.
    /// JPEGs are decoded once to reject corrupt data, then embedded from the
    /// original bytes.
    pub fn open(path: &Path) -> Result<Self, PageError> {
        let file = display_name(path);
        let decode_error = |source| PageError::Decode {
            file: file.clone(),
            source,
        };

        let bytes = std::fs::read(path).map_err(|e| decode_error(ImageError::IoError(e)))?;

        let mut reader = image::io::Reader::new(Cursor::new(bytes.as_slice()));
        if let Ok(format) = ImageFormat::from_path(path) {
            reader.set_format(format);
        }
        let reader = reader
            .with_guessed_format()
            .map_err(|e| decode_error(ImageError::IoError(e)))?;
        let format = reader.format();
        let decoded = reader.decode().map_err(decode_error)?;

        if format == Some(ImageFormat::Jpeg) {
            if let Some(color_space) = jpeg_color_space(&bytes) {
                let (width, height) = decoded.dimensions();
                return Ok(Self::from_jpeg(bytes, width, height, color_space));
            }
            log::debug!("{}: JPEG is not gray or RGB, re-encoding pixels", file);
        }

        Self::from_dynamic(&decoded).map_err(|source| PageError::Encode { file, source })
    }

    /// Wrap JPEG bytes without touching them
    pub fn from_jpeg(data: Vec<u8>, width: u32, height: u32, color_space: ColorSpace) -> Self {
        Self {
            width,
            height,
            color_space,
            filter: ImageFilter::Dct,
            data,
            soft_mask: None,
        }
    }

    /// Split and compress the pixels of an already decoded image
    pub fn from_dynamic(img: &DynamicImage) -> std::io::Result<Self> {
        let (width, height) = img.dimensions();
        let color = img.color();

        let (color_space, pixels, alpha) = match (color.has_color(), color.has_alpha()) {
            (false, false) => (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None),
            (false, true) => {
                let la = img.to_luma_alpha8();
                let mut gray = Vec::with_capacity(la.len() / 2);
                let mut alpha = Vec::with_capacity(la.len() / 2);
                for pixel in la.pixels() {
                    gray.push(pixel.0[0]);
                    alpha.push(pixel.0[1]);
                }
                (ColorSpace::DeviceGray, gray, Some(alpha))
            }
            (true, false) => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None),
            (true, true) => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
                let mut alpha = Vec::with_capacity(rgba.len() / 4);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                (ColorSpace::DeviceRGB, rgb, Some(alpha))
            }
        };

        // Fully opaque alpha adds nothing but size
        let alpha = alpha.filter(|a| a.iter().any(|&v| v != u8::MAX));

        Ok(Self {
            width,
            height,
            color_space,
            filter: ImageFilter::Flate,
            data: compress(&pixels)?,
            soft_mask: alpha.map(|a| compress(&a)).transpose()?,
        })
    }

    /// Build the image XObject stream
    ///
    /// `smask` is the object id of the soft mask stream built by
    /// [`EmbeddedImage::soft_mask_stream`], when there is one.
    pub fn xobject_stream(&self, smask: Option<lopdf::ObjectId>) -> Stream {
        let mut dict = image_dict(self.width, self.height, self.color_space, self.filter);
        if let Some(id) = smask {
            dict.set("SMask", Object::Reference(id));
        }
        encoded_stream(dict, self.data.clone())
    }

    /// Build the soft mask stream for the alpha channel
    pub fn soft_mask_stream(&self) -> Option<Stream> {
        self.soft_mask.as_ref().map(|mask| {
            let dict = image_dict(
                self.width,
                self.height,
                ColorSpace::DeviceGray,
                ImageFilter::Flate,
            );
            encoded_stream(dict, mask.clone())
        })
    }
}

fn image_dict(width: u32, height: u32, color_space: ColorSpace, filter: ImageFilter) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set("ColorSpace", Object::Name(color_space.pdf_name().as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(filter.pdf_name().as_bytes().to_vec()));
    dict
}

/// Stream whose content is already encoded; lopdf must not compress it again
fn encoded_stream(mut dict: Dictionary, content: Vec<u8>) -> Stream {
    dict.set("Length", Object::Integer(content.len() as i64));
    Stream {
        dict,
        content,
        allows_compression: false,
        start_position: None,
    }
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Color space of a JPEG that PDF readers can show from the raw bytes
///
/// Reads the component count from the first SOF segment. CMYK and other
/// layouts return `None`.
fn jpeg_color_space(data: &[u8]) -> Option<ColorSpace> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;

        match marker {
            // Fill bytes and markers without a length
            0xFF | 0x00 | 0x01 | 0xD0..=0xD7 => continue,
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                return match *data.get(pos + 7)? {
                    1 => Some(ColorSpace::DeviceGray),
                    3 => Some(ColorSpace::DeviceRGB),
                    _ => None,
                };
            }
            0xD9 | 0xDA => return None,
            _ => {
                let length = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]);
                pos += usize::from(length);
            }
        }
    }
    None
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Read;
    use tempfile::TempDir;

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .expect("Failed to inflate");
        out
    }

    #[test]
    fn test_rgb_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([10, 20, 30])));
        let embedded = EmbeddedImage::from_dynamic(&img).unwrap();

        assert_eq!((embedded.width, embedded.height), (4, 2));
        assert_eq!(embedded.color_space, ColorSpace::DeviceRGB);
        assert!(embedded.soft_mask.is_none());

        let pixels = inflate(&embedded.data);
        assert_eq!(pixels.len(), 4 * 2 * 3);
        assert_eq!(&pixels[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_gray_image_stays_gray() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([128])));
        let embedded = EmbeddedImage::from_dynamic(&img).unwrap();

        assert_eq!(embedded.color_space, ColorSpace::DeviceGray);
        assert_eq!(inflate(&embedded.data), vec![128; 9]);
    }

    #[test]
    fn test_alpha_becomes_soft_mask() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 64])));
        let embedded = EmbeddedImage::from_dynamic(&img).unwrap();

        let mask = embedded.soft_mask.as_ref().expect("Expected a soft mask");
        assert_eq!(inflate(mask), vec![64; 4]);
        assert_eq!(inflate(&embedded.data).len(), 2 * 2 * 3);
        assert!(embedded.soft_mask_stream().is_some());
    }

    #[test]
    fn test_opaque_alpha_is_dropped() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
        let embedded = EmbeddedImage::from_dynamic(&img).unwrap();
        assert!(embedded.soft_mask.is_none());
    }

    #[test]
    fn test_xobject_dict() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(100, 50));
        let embedded = EmbeddedImage::from_dynamic(&img).unwrap();
        let stream = embedded.xobject_stream(Some((7, 0)));

        let dict = &stream.dict;
        assert_eq!(dict.get(b"Subtype").and_then(Object::as_name).unwrap(), b"Image");
        assert_eq!(dict.get(b"Width").and_then(Object::as_i64).unwrap(), 100);
        assert_eq!(dict.get(b"Height").and_then(Object::as_i64).unwrap(), 50);
        assert_eq!(dict.get(b"Filter").and_then(Object::as_name).unwrap(), b"FlateDecode");
        assert_eq!(dict.get(b"SMask").and_then(Object::as_reference).unwrap(), (7, 0));
        assert_eq!(embedded.filter, ImageFilter::Flate);
        assert!(!stream.allows_compression);
    }

    #[test]
    fn test_open_detects_format_from_content() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        // PNG bytes behind a .jpg name
        let path = dir.path().join("mislabelled.jpg");
        RgbImage::from_pixel(5, 7, Rgb([0, 0, 0]))
            .save_with_format(&path, image::ImageFormat::Png)
            .expect("Failed to write image");

        let embedded = EmbeddedImage::open(&path).expect("Failed to decode");
        assert_eq!((embedded.width, embedded.height), (5, 7));
    }

    #[test]
    fn test_jpeg_is_embedded_untouched() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(40, 30, Rgb([200, 120, 40]))
            .save_with_format(&path, image::ImageFormat::Jpeg)
            .expect("Failed to write image");

        let embedded = EmbeddedImage::open(&path).expect("Failed to decode");
        assert_eq!((embedded.width, embedded.height), (40, 30));
        assert_eq!(embedded.filter, ImageFilter::Dct);
        assert_eq!(embedded.color_space, ColorSpace::DeviceRGB);
        assert_eq!(embedded.data, std::fs::read(&path).unwrap());

        let stream = embedded.xobject_stream(None);
        assert_eq!(
            stream.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
            b"DCTDecode"
        );
    }

    #[test]
    fn test_gray_jpeg_stays_gray() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("scan.jpeg");
        GrayImage::from_pixel(16, 16, Luma([90]))
            .save_with_format(&path, image::ImageFormat::Jpeg)
            .expect("Failed to write image");

        let embedded = EmbeddedImage::open(&path).expect("Failed to decode");
        assert_eq!(embedded.filter, ImageFilter::Dct);
        assert_eq!(embedded.color_space, ColorSpace::DeviceGray);
    }

    #[test]
    fn test_jpeg_color_space_from_frame_header() {
        // SOI, APP0 with a 2-byte body, then SOF0 for a 2x3 image
        let header = |components: u8| {
            vec![
                0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0xAA, 0xBB, 0xFF, 0xC0, 0x00, 0x11, 0x08,
                0x00, 0x03, 0x00, 0x02, components,
            ]
        };
        assert_eq!(jpeg_color_space(&header(1)), Some(ColorSpace::DeviceGray));
        assert_eq!(jpeg_color_space(&header(3)), Some(ColorSpace::DeviceRGB));
        assert_eq!(jpeg_color_space(&header(4)), None);
        assert_eq!(jpeg_color_space(b"\x89PNG"), None);
        assert_eq!(jpeg_color_space(&[0xFF, 0xD8, 0xFF, 0xC0, 0x00]), None);
    }

    #[test]
    fn test_open_garbage_is_decode_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = EmbeddedImage::open(&path).unwrap_err();
        assert!(matches!(err, PageError::Decode { .. }));
        assert_eq!(err.file(), "broken.png");
    }

    #[test]
    fn test_open_missing_file_is_decode_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let err = EmbeddedImage::open(&dir.path().join("gone.png")).unwrap_err();
        assert!(matches!(err, PageError::Decode { .. }));
    }
}
