//! Page source: splits a document into ordered raster pages
//!
//! # Supported inputs
//!
//! - Multi-page TIFF (every IFD becomes a page; 1-bit pages stay bilevel)
//! - Any single image format the `image` crate reads (one page)
//! - A directory of such files, sorted by file name
//! - Raw bytes of either of the above
//! - Pages already split by the caller

use crate::error::{OrientError, Result};
use crate::page::{Page, PageImage};
use crate::raster::BitImage;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::debug;

/// Image file extensions picked up from directories
const IMAGE_EXTENSIONS: &[&str] = &[
    "tif", "tiff", "png", "jpg", "jpeg", "bmp", "gif", "webp", "pnm", "pbm", "pgm",
];

/// A document to split into pages
#[derive(Debug, Clone)]
pub enum Document {
    /// File or directory on disk
    Path(PathBuf),
    /// In-memory container bytes
    Bytes(Vec<u8>),
    /// Pages already split, numbered by position
    Pages(Vec<PageImage>),
}

impl Document {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Document::Path(path.into())
    }
}

impl From<PathBuf> for Document {
    fn from(path: PathBuf) -> Self {
        Document::Path(path)
    }
}

impl From<&Path> for Document {
    fn from(path: &Path) -> Self {
        Document::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for Document {
    fn from(bytes: Vec<u8>) -> Self {
        Document::Bytes(bytes)
    }
}

impl From<Vec<DynamicImage>> for Document {
    fn from(images: Vec<DynamicImage>) -> Self {
        Document::Pages(images.into_iter().map(PageImage::Pixels).collect())
    }
}

/// Splits documents into pages
pub trait PageSource: Send + Sync {
    /// Ordered, finite page sequence; numbering is 1-based by position
    fn split(&self, document: Document) -> Result<Vec<Page>>;
}

/// Page source for TIFF containers, single images and image directories
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePageSource {
    /// Stop after this many pages
    pub max_pages: Option<usize>,
}

impl FilePageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(max_pages: usize) -> Self {
        Self {
            max_pages: Some(max_pages),
        }
    }

    /// Pages still wanted; decoding stops once this many are collected
    fn limit(&self) -> usize {
        self.max_pages.unwrap_or(usize::MAX)
    }

    fn images_from_path(&self, path: &Path) -> Result<Vec<PageImage>> {
        if !path.exists() {
            return Err(OrientError::InvalidInput(format!(
                "input not found: {}",
                path.display()
            )));
        }

        let limit = self.limit();
        if path.is_dir() {
            let mut images = Vec::new();
            for file in collect_image_files(path)? {
                if images.len() >= limit {
                    break;
                }
                images.extend(self.images_from_file(&file, limit - images.len())?);
            }
            return Ok(images);
        }

        self.images_from_file(path, limit)
    }

    fn images_from_file(&self, path: &Path, limit: usize) -> Result<Vec<PageImage>> {
        if has_tiff_extension(path) {
            let reader = BufReader::new(File::open(path)?);
            return TiffPages::new(reader)
                .map_err(|e| with_source(e, path))?
                .take(limit)
                .collect::<Result<Vec<_>>>()
                .map_err(|e| with_source(e, path));
        }

        let img = image::open(path).map_err(|e| {
            OrientError::InvalidInput(format!("unreadable image {}: {}", path.display(), e))
        })?;
        Ok(vec![PageImage::Pixels(img)])
    }

    fn images_from_bytes(&self, bytes: Vec<u8>) -> Result<Vec<PageImage>> {
        if is_tiff(&bytes) {
            return TiffPages::new(Cursor::new(bytes))?
                .take(self.limit())
                .collect();
        }
        let img = image::load_from_memory(&bytes)
            .map_err(|e| OrientError::InvalidInput(format!("unreadable container: {}", e)))?;
        Ok(vec![PageImage::Pixels(img)])
    }
}

impl PageSource for FilePageSource {
    fn split(&self, document: Document) -> Result<Vec<Page>> {
        let mut images = match document {
            Document::Path(path) => self.images_from_path(&path)?,
            Document::Bytes(bytes) => self.images_from_bytes(bytes)?,
            Document::Pages(images) => images,
        };

        if let Some(max) = self.max_pages {
            images.truncate(max);
        }
        if images.is_empty() {
            return Err(OrientError::InvalidInput(
                "document has no pages".to_string(),
            ));
        }
        let empty = images
            .iter()
            .position(|img| img.width() == 0 || img.height() == 0);
        if let Some(idx) = empty {
            return Err(OrientError::InvalidInput(format!(
                "page {} is empty",
                idx + 1
            )));
        }

        debug!(pages = images.len(), "document split");
        Ok(Page::sequence(images))
    }
}

fn with_source(err: OrientError, path: &Path) -> OrientError {
    match err {
        OrientError::InvalidInput(msg) => {
            OrientError::InvalidInput(format!("{}: {}", path.display(), msg))
        }
        OrientError::UnsupportedFormat(msg) => {
            OrientError::UnsupportedFormat(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

fn has_tiff_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

/// Little- or big-endian TIFF magic
fn is_tiff(bytes: &[u8]) -> bool {
    bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*")
}

/// Image files directly inside `dir`, sorted by name
fn collect_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if path.is_file() && is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================
// TIFF decoding
// ============================================================

/// Lazy iterator over the pages of a TIFF container
pub struct TiffPages<R: Read + Seek> {
    decoder: Decoder<R>,
    /// Index of the next page to decode; `None` once exhausted
    next: Option<usize>,
    /// Error advancing to the following IFD, yielded after the current page
    pending: Option<OrientError>,
}

impl<R: Read + Seek> TiffPages<R> {
    /// Open a TIFF stream
    pub fn new(reader: R) -> Result<Self> {
        let decoder = Decoder::new(reader)
            .map_err(|e| OrientError::InvalidInput(format!("unreadable TIFF: {}", e)))?;
        Ok(Self {
            decoder,
            next: Some(0),
            pending: None,
        })
    }

    fn decode_current(&mut self, index: usize) -> Result<PageImage> {
        let page = index + 1;
        let tiff_err =
            |e: tiff::TiffError| OrientError::InvalidInput(format!("TIFF page {}: {}", page, e));

        let (width, height) = self.decoder.dimensions().map_err(tiff_err)?;
        let color = self.decoder.colortype().map_err(tiff_err)?;
        let data = self.decoder.read_image().map_err(tiff_err)?;

        let unsupported = || {
            OrientError::UnsupportedFormat(format!(
                "TIFF page {} has unsupported color type {:?}",
                page, color
            ))
        };

        let image = match (color, data) {
            (ColorType::Gray(1), DecodingResult::U8(bits)) => {
                // Decoder output is normalized to BlackIsZero, Group 4 fax strips included
                PageImage::Bilevel(BitImage::from_packed(width, height, bits, false)?)
            }
            (ColorType::Gray(8), DecodingResult::U8(buf)) => {
                let gray = GrayImage::from_raw(width, height, buf).ok_or_else(unsupported)?;
                PageImage::Pixels(DynamicImage::ImageLuma8(gray))
            }
            (ColorType::Gray(16), DecodingResult::U16(buf)) => {
                let gray: ImageBuffer<Luma<u16>, Vec<u16>> =
                    ImageBuffer::from_raw(width, height, buf).ok_or_else(unsupported)?;
                PageImage::Pixels(DynamicImage::ImageLuma16(gray))
            }
            (ColorType::RGB(8), DecodingResult::U8(buf)) => {
                let rgb = RgbImage::from_raw(width, height, buf).ok_or_else(unsupported)?;
                PageImage::Pixels(DynamicImage::ImageRgb8(rgb))
            }
            (ColorType::RGBA(8), DecodingResult::U8(buf)) => {
                let rgba = RgbaImage::from_raw(width, height, buf).ok_or_else(unsupported)?;
                PageImage::Pixels(DynamicImage::ImageRgba8(rgba))
            }
            // CMYK, palette, float and deeper samples
            _ => return Err(unsupported()),
        };
        Ok(image)
    }
}

impl<R: Read + Seek> Iterator for TiffPages<R> {
    type Item = Result<PageImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }
        let index = self.next.take()?;
        let page = self.decode_current(index);

        if page.is_ok() && self.decoder.more_images() {
            match self.decoder.next_image() {
                Ok(()) => self.next = Some(index + 1),
                Err(e) => {
                    self.pending = Some(OrientError::InvalidInput(format!(
                        "TIFF page {}: {}",
                        index + 2,
                        e
                    )))
                }
            }
        }
        Some(page)
    }
}
