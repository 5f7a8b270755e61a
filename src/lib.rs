//! page-orient - Page orientation detection for scanned documents
//!
//! Splits a multi-page document into pages, classifies each page as upright,
//! upside down or undetectable using a text recognizer's confidence, and
//! returns one verdict per page in page order. Pages are classified in
//! parallel on a bounded worker pool.
//!
//! # Modules
//!
//! - [`source`] - Document splitting (multi-page TIFF, images, directories)
//! - [`raster`] - Bit-depth normalization
//! - [`recognizer`] - Text recognizer interface and tesseract backend
//! - [`layout`] - Region hierarchy returned by the recognizer
//! - [`classifier`] - Per-page orientation decision
//! - [`dispatcher`] - Worker pool and ordered result collection
//! - [`pipeline`] - Document-level entry point
//! - [`config`] - Configuration file support
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use page_orient::{Config, CliOverrides, Document, OrientationPipeline};
//!
//! let config = Config::load().unwrap_or_default().merge_with_cli(&CliOverrides::new());
//! let pipeline = OrientationPipeline::new(config).unwrap();
//! let verdicts = pipeline.detect_page_orientation(Document::path("scan.tiff")).unwrap();
//! println!("{:?}", verdicts);
//! ```

pub mod cancel;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod layout;
pub mod page;
pub mod pipeline;
pub mod progress;
pub mod raster;
pub mod recognizer;
pub mod source;

// Cancellation
pub use cancel::CancellationToken;

// Classifier
pub use classifier::{
    decide, Classification, OrientationClassifier, PageClassifier, HIGH_CONFIDENCE,
    LOW_CONFIDENCE_FLOOR, MIN_ANCHOR_WORDS,
};

// CLI
pub use cli::{exit_codes, Cli, Commands, DetectArgs, OutputFormat};

// Config
pub use config::{CliOverrides, Config};

// Dispatcher
pub use dispatcher::{worker_count, DispatchOptions, DispatchReport, Dispatcher};

// Errors
pub use error::{OrientError, Result, Stage};

// Layout
pub use layout::{AnchorSearch, Block, BoundingBox, LayoutResult, Line, Paragraph, Word};

// Pages
pub use page::{Page, PageImage, PageVerdict, Verdict};

// Pipeline
pub use pipeline::{correct_page, DetectionReport, OrientationPipeline, PipelineConfig};

// Progress
pub use progress::{NoProgress, OutputMode, ProcessingStage, ProgressCallback, VerdictTally};

// Raster
pub use raster::{BitDepth, BitImage, PaletteRasterAdapter, RasterAdapter};

// Recognizer
pub use recognizer::{
    parse_tsv, RecognitionMode, Recognizer, TesseractOptions, TesseractOptionsBuilder,
    TesseractRecognizer,
};

// Page source
pub use source::{Document, FilePageSource, PageSource, TiffPages};
