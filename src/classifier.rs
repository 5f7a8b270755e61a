//! Per-page orientation classifier
//!
//! # Algorithm
//!
//! 1. Normalize 1-bit pages to 8-bit grayscale
//! 2. Run a layout pass on the full page and look for an anchor paragraph
//!    (the first one with at least [`MIN_ANCHOR_WORDS`] words)
//! 3. No region at all: the page is `Undetectable`
//! 4. Crop to the anchor when there is one, otherwise keep the full page
//! 5. First text pass on the working image; confidence above
//!    [`HIGH_CONFIDENCE`] means `Correct`
//! 6. Second text pass on the working image rotated 180°
//! 7. Compare both confidences against [`LOW_CONFIDENCE_FLOOR`]
//!
//! # Example
//!
//! ```rust,no_run
//! use page_orient::{
//!     OrientationClassifier, Page, PageClassifier, TesseractOptions, TesseractRecognizer,
//! };
//!
//! let recognizer = TesseractRecognizer::new(TesseractOptions::default()).unwrap();
//! let classifier = OrientationClassifier::new(recognizer);
//!
//! let page = Page::new(1, image::open("scan.png").unwrap());
//! println!("{}", classifier.classify(page).unwrap());
//! ```

use crate::error::{OrientError, Result, Stage};
use crate::layout::{AnchorSearch, BoundingBox};
use crate::page::{Page, PageImage, Verdict};
use crate::raster::{BitDepth, PaletteRasterAdapter, RasterAdapter};
use crate::recognizer::{RecognitionMode, Recognizer};
use image::DynamicImage;
use std::borrow::Cow;
use tracing::debug;

// ============================================================
// Constants
// ============================================================

/// First-pass confidence above which a page is accepted as upright
pub const HIGH_CONFIDENCE: f32 = 0.75;

/// Confidence a pass must exceed to count as readable
pub const LOW_CONFIDENCE_FLOOR: f32 = 0.40;

/// Words a paragraph needs to serve as the anchor region
pub const MIN_ANCHOR_WORDS: usize = 5;

// ============================================================
// Types
// ============================================================

/// Anything that turns a page into a verdict
pub trait PageClassifier: Send + Sync {
    /// Classify one page, consuming it
    fn classify(&self, page: Page) -> Result<Verdict>;
}

impl<F> PageClassifier for F
where
    F: Fn(Page) -> Result<Verdict> + Send + Sync,
{
    fn classify(&self, page: Page) -> Result<Verdict> {
        self(page)
    }
}

/// Verdict plus the signals that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub verdict: Verdict,
    /// Anchor paragraph used for cropping, if one qualified
    pub anchor: Option<BoundingBox>,
    /// First-pass mean confidence (not run for pages without regions)
    pub first_pass: Option<f32>,
    /// Second-pass mean confidence (not run after a high-confidence first pass)
    pub second_pass: Option<f32>,
}

impl Classification {
    fn without_region() -> Self {
        Self {
            verdict: Verdict::Undetectable,
            anchor: None,
            first_pass: None,
            second_pass: None,
        }
    }
}

/// Combine both pass confidences into a verdict
///
/// A pass counts once it clears [`LOW_CONFIDENCE_FLOOR`]. When at least one
/// does, the orientation with the higher confidence wins and ties go to
/// `Correct`. When neither does, the page is `Undetectable`.
pub fn decide(first_pass: f32, second_pass: f32) -> Verdict {
    if first_pass > LOW_CONFIDENCE_FLOOR || second_pass > LOW_CONFIDENCE_FLOOR {
        if first_pass >= second_pass {
            Verdict::Correct
        } else {
            Verdict::UpsideDown
        }
    } else {
        Verdict::Undetectable
    }
}

// ============================================================
// Classifier
// ============================================================

/// Two-pass confidence classifier over a [`Recognizer`]
#[derive(Debug, Clone)]
pub struct OrientationClassifier<R, A = PaletteRasterAdapter> {
    recognizer: R,
    adapter: A,
}

impl<R: Recognizer> OrientationClassifier<R, PaletteRasterAdapter> {
    /// Create a classifier with the palette raster adapter
    pub fn new(recognizer: R) -> Self {
        Self::with_adapter(recognizer, PaletteRasterAdapter)
    }
}

impl<R: Recognizer, A: RasterAdapter> OrientationClassifier<R, A> {
    /// Create a classifier with a custom raster adapter
    pub fn with_adapter(recognizer: R, adapter: A) -> Self {
        Self {
            recognizer,
            adapter,
        }
    }

    /// Classify a page and keep the intermediate signals
    pub fn classify_detailed(&self, page: Page) -> Result<Classification> {
        let number = page.number;
        self.classify_image(number, page.image)
            .map_err(|e| e.on_page(number))
    }

    fn classify_image(&self, number: u32, image: PageImage) -> Result<Classification> {
        let image = self.prepare(image)?;

        let layout = self
            .recognizer
            .recognize(&image, RecognitionMode::Layout)
            .map_err(|e| e.at_stage(Stage::LayoutAnalysis))?;

        let anchor = match layout.find_anchor(MIN_ANCHOR_WORDS) {
            AnchorSearch::NoRegion => {
                debug!(page = number, "no text region found");
                return Ok(Classification::without_region());
            }
            AnchorSearch::BelowThreshold => None,
            AnchorSearch::Anchor(bbox) => bbox.clamp_to(image.width(), image.height()),
        };

        let working: Cow<'_, DynamicImage> = match anchor {
            Some(bbox) => Cow::Owned(image.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height)),
            None => Cow::Borrowed(&image),
        };

        let first_pass = self
            .recognizer
            .recognize(&working, RecognitionMode::Text)
            .map_err(|e| e.at_stage(Stage::FirstPass))?
            .mean_confidence;

        if first_pass > HIGH_CONFIDENCE {
            debug!(page = number, first_pass, ?anchor, "high-confidence first pass");
            return Ok(Classification {
                verdict: Verdict::Correct,
                anchor,
                first_pass: Some(first_pass),
                second_pass: None,
            });
        }

        let rotated = working.rotate180();
        let second_pass = self
            .recognizer
            .recognize(&rotated, RecognitionMode::Text)
            .map_err(|e| e.at_stage(Stage::SecondPass))?
            .mean_confidence;

        let verdict = decide(first_pass, second_pass);
        debug!(page = number, first_pass, second_pass, ?anchor, %verdict, "page classified");

        Ok(Classification {
            verdict,
            anchor,
            first_pass: Some(first_pass),
            second_pass: Some(second_pass),
        })
    }

    /// Bring the raster to a depth the recognizer accepts
    fn prepare(&self, image: PageImage) -> Result<DynamicImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OrientError::InvalidInput(
                "page has zero dimensions".to_string(),
            ));
        }

        let image = if image.is_bilevel() {
            self.adapter.normalize_depth(image, BitDepth::Eight)?
        } else {
            image
        };

        match image {
            PageImage::Pixels(img) => Ok(img),
            PageImage::Bilevel(_) => Err(OrientError::UnsupportedFormat(
                "raster adapter returned a 1-bit raster for an 8-bit request".to_string(),
            )),
        }
    }
}

impl<R: Recognizer, A: RasterAdapter> PageClassifier for OrientationClassifier<R, A> {
    fn classify(&self, page: Page) -> Result<Verdict> {
        self.classify_detailed(page).map(|c| c.verdict)
    }
}
