//! Text recognizer interface
//!
//! The classifier only needs two things from a recognizer: the region
//! hierarchy of a page and a scalar confidence for a pass. Any engine that can
//! produce a [`LayoutResult`] can plug in through [`Recognizer`].
//!
//! # Example
//!
//! ```rust,no_run
//! use page_orient::{RecognitionMode, Recognizer, TesseractOptions, TesseractRecognizer};
//!
//! let options = TesseractOptions::builder().language("eng").build();
//! let recognizer = TesseractRecognizer::new(options).unwrap();
//!
//! let img = image::open("page.png").unwrap();
//! let layout = recognizer.recognize(&img, RecognitionMode::Text).unwrap();
//! println!("confidence: {:.2}", layout.mean_confidence);
//! ```

mod tesseract;
mod tsv;

pub use tesseract::{
    TesseractOptions, TesseractOptionsBuilder, TesseractRecognizer, DEFAULT_LANGUAGE,
};
pub use tsv::parse_tsv;

use crate::error::Result;
use crate::layout::LayoutResult;
use image::DynamicImage;

/// Kind of recognition pass requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Automatic page segmentation with orientation/script analysis
    Layout,
    /// Plain text recognition, no orientation analysis
    Text,
}

/// A blocking text-recognition engine
pub trait Recognizer: Send + Sync {
    /// Recognize `image` and return its layout and mean confidence
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> Result<LayoutResult>;
}

impl<R: Recognizer + ?Sized> Recognizer for &R {
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> Result<LayoutResult> {
        (**self).recognize(image, mode)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> Result<LayoutResult> {
        (**self).recognize(image, mode)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for std::sync::Arc<R> {
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> Result<LayoutResult> {
        (**self).recognize(image, mode)
    }
}
