//! Raster depth normalization
//!
//! Recognition engines want at least 8 bits per pixel, while scanned archives
//! are full of 1-bit (fax-style) pages. This module converts between the two
//! by mapping pixels through an indexed grayscale palette. It is a format
//! conversion only: no filtering, no resampling of geometry.

use crate::error::{OrientError, Result};
use crate::page::PageImage;
use image::{DynamicImage, GrayImage, Luma};

/// Gray level at or above which an 8-bit pixel becomes white in 1-bit output
const BILEVEL_THRESHOLD: u8 = 128;

/// Target depth for [`RasterAdapter::normalize_depth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    One,
    Eight,
}

impl BitDepth {
    /// Bits per pixel
    pub fn bits(&self) -> u32 {
        match self {
            BitDepth::One => 1,
            BitDepth::Eight => 8,
        }
    }
}

/// Packed 1-bit-per-pixel raster
///
/// Rows are MSB-first and padded to a whole byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitImage {
    width: u32,
    height: u32,
    /// When set, a 0 bit is white (TIFF `WhiteIsZero`)
    white_is_zero: bool,
    data: Vec<u8>,
}

impl BitImage {
    /// Wrap packed rows, validating the buffer length
    pub fn from_packed(
        width: u32,
        height: u32,
        data: Vec<u8>,
        white_is_zero: bool,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(OrientError::UnsupportedFormat(format!(
                "bilevel raster has zero dimensions ({}x{})",
                width, height
            )));
        }
        let needed = Self::stride_for(width) * height as usize;
        if data.len() < needed {
            return Err(OrientError::UnsupportedFormat(format!(
                "bilevel raster {}x{} needs {} bytes, got {}",
                width,
                height,
                needed,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            white_is_zero,
            data,
        })
    }

    /// All-white raster
    pub fn new_white(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            white_is_zero: false,
            data: vec![0xFF; Self::stride_for(width) * height as usize],
        }
    }

    fn stride_for(width: u32) -> usize {
        width.div_ceil(8) as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        Self::stride_for(self.width)
    }

    /// Whether the pixel at (x, y) is white
    pub fn is_white(&self, x: u32, y: u32) -> bool {
        let byte = self.data[y as usize * self.stride() + (x / 8) as usize];
        let bit = (byte >> (7 - (x % 8))) & 1 == 1;
        bit != self.white_is_zero
    }

    /// Set the pixel at (x, y)
    pub fn set_white(&mut self, x: u32, y: u32, white: bool) {
        let idx = y as usize * self.stride() + (x / 8) as usize;
        let mask = 0x80u8 >> (x % 8);
        if white != self.white_is_zero {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Raw packed rows
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Linear grayscale palette with `2^bits` entries from black to white
pub fn grayscale_palette(depth: BitDepth) -> Vec<u8> {
    let entries = 1u32 << depth.bits();
    (0..entries)
        .map(|i| (i * 255 / (entries - 1)) as u8)
        .collect()
}

/// Converts page rasters between bit depths
pub trait RasterAdapter: Send + Sync {
    /// Convert `image` to `target` depth, keeping width and height
    fn normalize_depth(&self, image: PageImage, target: BitDepth) -> Result<PageImage>;
}

/// Palette-based adapter for bilevel and 8-bit grayscale rasters
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteRasterAdapter;

impl PaletteRasterAdapter {
    pub fn new() -> Self {
        Self
    }

    fn bilevel_to_gray(bits: &BitImage) -> GrayImage {
        let palette = grayscale_palette(BitDepth::One);
        let (black, white) = (palette[0], palette[1]);
        let stride = bits.stride();
        let mut gray = GrayImage::new(bits.width(), bits.height());

        for (y, row) in bits.as_bytes().chunks(stride).take(bits.height() as usize).enumerate() {
            for x in 0..bits.width() {
                let bit = (row[(x / 8) as usize] >> (7 - (x % 8))) & 1 == 1;
                let value = if bit != bits.white_is_zero { white } else { black };
                gray.put_pixel(x, y as u32, Luma([value]));
            }
        }
        gray
    }

    fn gray_to_bilevel(gray: &GrayImage) -> BitImage {
        let mut bits = BitImage {
            width: gray.width(),
            height: gray.height(),
            white_is_zero: false,
            data: vec![0u8; BitImage::stride_for(gray.width()) * gray.height() as usize],
        };
        for (x, y, pixel) in gray.enumerate_pixels() {
            if pixel[0] >= BILEVEL_THRESHOLD {
                bits.set_white(x, y, true);
            }
        }
        bits
    }
}

impl RasterAdapter for PaletteRasterAdapter {
    fn normalize_depth(&self, image: PageImage, target: BitDepth) -> Result<PageImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OrientError::UnsupportedFormat(
                "raster has zero dimensions".to_string(),
            ));
        }

        match (image, target) {
            (PageImage::Bilevel(bits), BitDepth::One) => Ok(PageImage::Bilevel(bits)),
            (PageImage::Bilevel(bits), BitDepth::Eight) => Ok(PageImage::Pixels(
                DynamicImage::ImageLuma8(Self::bilevel_to_gray(&bits)),
            )),
            (PageImage::Pixels(DynamicImage::ImageLuma8(gray)), BitDepth::Eight) => {
                Ok(PageImage::Pixels(DynamicImage::ImageLuma8(gray)))
            }
            (PageImage::Pixels(img), BitDepth::Eight) => {
                Ok(PageImage::Pixels(DynamicImage::ImageLuma8(img.to_luma8())))
            }
            (PageImage::Pixels(img), BitDepth::One) => {
                Ok(PageImage::Bilevel(Self::gray_to_bilevel(&img.to_luma8())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn checkerboard(width: u32, height: u32) -> BitImage {
        let mut bits = BitImage::new_white(width, height);
        for y in 0..height {
            for x in 0..width {
                bits.set_white(x, y, (x + y) % 2 == 0);
            }
        }
        bits
    }

    #[test]
    fn test_palettes() {
        assert_eq!(grayscale_palette(BitDepth::One), vec![0, 255]);
        let ramp = grayscale_palette(BitDepth::Eight);
        assert_eq!(ramp.len(), 256);
        assert_eq!(ramp[0], 0);
        assert_eq!(ramp[128], 128);
        assert_eq!(ramp[255], 255);
    }

    #[test]
    fn test_from_packed_rejects_short_buffer() {
        let result = BitImage::from_packed(16, 2, vec![0u8; 3], false);
        assert!(matches!(result, Err(OrientError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_from_packed_rejects_zero_size() {
        let result = BitImage::from_packed(0, 2, vec![], false);
        assert!(matches!(result, Err(OrientError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_stride_padding() {
        let bits = BitImage::new_white(9, 3);
        assert_eq!(bits.stride(), 2);
        assert_eq!(bits.as_bytes().len(), 6);
    }

    #[test]
    fn test_bilevel_to_eight_bit_keeps_size_and_pixels() {
        let bits = checkerboard(11, 7);
        let adapter = PaletteRasterAdapter::new();
        let out = adapter
            .normalize_depth(PageImage::Bilevel(bits.clone()), BitDepth::Eight)
            .unwrap();

        let PageImage::Pixels(DynamicImage::ImageLuma8(gray)) = out else {
            panic!("expected 8-bit grayscale output");
        };
        assert_eq!(gray.dimensions(), (11, 7));
        for (x, y, pixel) in gray.enumerate_pixels() {
            let expected = if bits.is_white(x, y) { 255 } else { 0 };
            assert_eq!(pixel[0], expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_white_is_zero_inverts() {
        // One row, first pixel bit clear, rest set
        let bits = BitImage::from_packed(8, 1, vec![0b0111_1111], true).unwrap();
        assert!(bits.is_white(0, 0));
        assert!(!bits.is_white(1, 0));

        let out = PaletteRasterAdapter
            .normalize_depth(PageImage::Bilevel(bits), BitDepth::Eight)
            .unwrap();
        let PageImage::Pixels(img) = out else {
            panic!("expected pixels");
        };
        let gray = img.to_luma8();
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_rgb_to_one_bit_thresholds() {
        let mut rgb = RgbImage::from_pixel(4, 2, Rgb([250, 250, 250]));
        rgb.put_pixel(1, 1, Rgb([10, 10, 10]));
        let out = PaletteRasterAdapter
            .normalize_depth(
                PageImage::Pixels(DynamicImage::ImageRgb8(rgb)),
                BitDepth::One,
            )
            .unwrap();

        let PageImage::Bilevel(bits) = out else {
            panic!("expected bilevel output");
        };
        assert_eq!((bits.width(), bits.height()), (4, 2));
        assert!(bits.is_white(0, 0));
        assert!(!bits.is_white(1, 1));
    }

    #[test]
    fn test_rgb_to_eight_bit_is_grayscale() {
        let rgb = RgbImage::from_pixel(3, 3, Rgb([0, 0, 0]));
        let out = PaletteRasterAdapter
            .normalize_depth(PageImage::Pixels(DynamicImage::ImageRgb8(rgb)), BitDepth::Eight)
            .unwrap();
        assert!(matches!(out, PageImage::Pixels(DynamicImage::ImageLuma8(_))));
    }

    #[test]
    fn test_zero_sized_pixels_unsupported() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let result =
            PaletteRasterAdapter.normalize_depth(PageImage::Pixels(empty), BitDepth::Eight);
        assert!(matches!(result, Err(OrientError::UnsupportedFormat(_))));
    }
}
