//! Page and verdict types
//!
//! A [`Page`] is one raster image taken from a multi-page document together
//! with its 1-based position. A [`Verdict`] is the orientation outcome for one
//! page.

use crate::raster::BitImage;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raster content of a page
#[derive(Debug, Clone)]
pub enum PageImage {
    /// 1 bit per pixel, indexed black/white palette
    Bilevel(BitImage),
    /// 8 bits per channel or wider
    Pixels(DynamicImage),
}

impl PageImage {
    /// Width in pixels
    pub fn width(&self) -> u32 {
        match self {
            PageImage::Bilevel(bits) => bits.width(),
            PageImage::Pixels(img) => img.width(),
        }
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        match self {
            PageImage::Bilevel(bits) => bits.height(),
            PageImage::Pixels(img) => img.height(),
        }
    }

    /// Whether this raster is 1-bit indexed
    pub fn is_bilevel(&self) -> bool {
        matches!(self, PageImage::Bilevel(_))
    }
}

impl From<DynamicImage> for PageImage {
    fn from(img: DynamicImage) -> Self {
        PageImage::Pixels(img)
    }
}

impl From<BitImage> for PageImage {
    fn from(bits: BitImage) -> Self {
        PageImage::Bilevel(bits)
    }
}

/// One page of a document
#[derive(Debug, Clone)]
pub struct Page {
    /// Page number (1-based)
    pub number: u32,
    /// Raster content
    pub image: PageImage,
}

impl Page {
    /// Create a page
    pub fn new(number: u32, image: impl Into<PageImage>) -> Self {
        Self {
            number,
            image: image.into(),
        }
    }

    /// Number a sequence of rasters 1..=N in order
    pub fn sequence<I, T>(images: I) -> Vec<Page>
    where
        I: IntoIterator<Item = T>,
        T: Into<PageImage>,
    {
        images
            .into_iter()
            .enumerate()
            .map(|(idx, img)| Page::new(idx as u32 + 1, img))
            .collect()
    }
}

/// Orientation verdict for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Text is right-side-up
    Correct,
    /// Text is rotated 180°
    UpsideDown,
    /// Text is rotated 90° counter-clockwise (reserved, never produced)
    RotatedLeft,
    /// Text is rotated 90° clockwise (reserved, never produced)
    RotatedRight,
    /// Too little recognizable text to judge
    Undetectable,
}

impl Verdict {
    /// Snake-case name, matching the serialized form
    pub fn name(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::UpsideDown => "upside_down",
            Verdict::RotatedLeft => "rotated_left",
            Verdict::RotatedRight => "rotated_right",
            Verdict::Undetectable => "undetectable",
        }
    }

    /// Degrees of clockwise rotation that would make the page upright
    pub fn correction_degrees(&self) -> Option<u32> {
        match self {
            Verdict::Correct => Some(0),
            Verdict::UpsideDown => Some(180),
            Verdict::RotatedLeft => Some(90),
            Verdict::RotatedRight => Some(270),
            Verdict::Undetectable => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Verdict tagged with its page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVerdict {
    pub page_number: u32,
    pub verdict: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_sequence_numbers_from_one() {
        let images: Vec<DynamicImage> = (0..3)
            .map(|_| DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([255]))))
            .collect();
        let pages = Page::sequence(images);
        let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_page_image_dimensions() {
        let img = PageImage::from(DynamicImage::ImageLuma8(GrayImage::new(30, 20)));
        assert_eq!(img.width(), 30);
        assert_eq!(img.height(), 20);
        assert!(!img.is_bilevel());

        let bits = PageImage::from(BitImage::new_white(9, 5));
        assert_eq!(bits.width(), 9);
        assert_eq!(bits.height(), 5);
        assert!(bits.is_bilevel());
    }

    #[test]
    fn test_verdict_serde_names() {
        let json = serde_json::to_string(&Verdict::UpsideDown).unwrap();
        assert_eq!(json, "\"upside_down\"");
        let back: Verdict = serde_json::from_str("\"undetectable\"").unwrap();
        assert_eq!(back, Verdict::Undetectable);
        assert_eq!(Verdict::RotatedLeft.to_string(), "rotated_left");
    }

    #[test]
    fn test_correction_degrees() {
        assert_eq!(Verdict::Correct.correction_degrees(), Some(0));
        assert_eq!(Verdict::UpsideDown.correction_degrees(), Some(180));
        assert_eq!(Verdict::Undetectable.correction_degrees(), None);
    }
}
