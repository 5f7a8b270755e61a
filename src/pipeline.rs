//! Orientation detection pipeline
//!
//! Ties the page source, classifier and dispatcher together behind one entry
//! point: a document goes in, one verdict per page comes out in page order.
//!
//! # Example
//!
//! ```rust,no_run
//! use page_orient::{Document, OrientationPipeline, PipelineConfig};
//!
//! let pipeline = OrientationPipeline::new(PipelineConfig::default()).unwrap();
//! let verdicts = pipeline
//!     .detect_page_orientation(Document::path("scan.tiff"))
//!     .unwrap();
//! for (idx, verdict) in verdicts.iter().enumerate() {
//!     println!("page {}: {}", idx + 1, verdict);
//! }
//! ```

use crate::cancel::CancellationToken;
use crate::classifier::{OrientationClassifier, PageClassifier};
use crate::dispatcher::{DispatchOptions, Dispatcher};
use crate::error::{OrientError, Result};
use crate::page::{Page, PageImage, PageVerdict, Verdict};
use crate::progress::{NoProgress, ProcessingStage, ProgressCallback, VerdictTally};
use crate::raster::{BitDepth, PaletteRasterAdapter, RasterAdapter};
use crate::recognizer::{TesseractOptions, TesseractRecognizer, DEFAULT_LANGUAGE};
use crate::source::{Document, FilePageSource, PageSource};
use chrono::{DateTime, Local};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Resolved pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Recognizer language selector
    pub language: String,
    /// Explicit tesseract binary; looked up on `PATH` when unset
    pub tesseract_path: Option<PathBuf>,
    pub tessdata_dir: Option<PathBuf>,
    /// Worker threads; CPU count when unset
    pub threads: Option<usize>,
    /// Only classify the first N pages
    pub max_pages: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            tesseract_path: None,
            tessdata_dir: None,
            threads: None,
            max_pages: None,
        }
    }
}

impl PipelineConfig {
    fn tesseract_options(&self) -> TesseractOptions {
        let mut builder = TesseractOptions::builder().language(self.language.clone());
        if let Some(path) = &self.tesseract_path {
            builder = builder.tesseract_path(path);
        }
        if let Some(dir) = &self.tessdata_dir {
            builder = builder.tessdata_dir(dir);
        }
        builder.build()
    }

    fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            parallelism: self.threads,
        }
    }

    fn page_source(&self) -> FilePageSource {
        FilePageSource {
            max_pages: self.max_pages,
        }
    }
}

/// Outcome of one detection run
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub generated_at: DateTime<Local>,
    /// Settings the run was made with
    pub config: PipelineConfig,
    pub workers: usize,
    pub elapsed_seconds: f64,
    pub summary: VerdictTally,
    pub pages: Vec<PageVerdict>,
}

impl DetectionReport {
    /// Verdicts in page order, without page numbers
    pub fn verdicts(&self) -> Vec<Verdict> {
        self.pages.iter().map(|pv| pv.verdict).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::other(format!("failed to serialize report: {}", e)).into())
    }
}

/// Document-level orientation detector
pub struct OrientationPipeline {
    config: PipelineConfig,
    source: Box<dyn PageSource>,
    classifier: Box<dyn PageClassifier>,
    dispatcher: Dispatcher,
}

impl OrientationPipeline {
    /// Pipeline backed by the tesseract CLI and file-based page source
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let recognizer = TesseractRecognizer::new(config.tesseract_options())?;
        info!(
            binary = %recognizer.binary().display(),
            language = %recognizer.options().language,
            "recognizer ready"
        );
        let source = config.page_source();
        Ok(Self::with_parts(
            config,
            source,
            OrientationClassifier::new(recognizer),
        ))
    }

    /// Pipeline with injected page source and classifier
    pub fn with_parts<S, C>(config: PipelineConfig, source: S, classifier: C) -> Self
    where
        S: PageSource + 'static,
        C: PageClassifier + 'static,
    {
        let dispatcher = Dispatcher::new(config.dispatch_options());
        Self {
            config,
            source: Box::new(source),
            classifier: Box::new(classifier),
            dispatcher,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split a document into numbered pages without classifying them
    pub fn pages(&self, document: Document) -> Result<Vec<Page>> {
        self.source.split(document)
    }

    /// One verdict per page, `output[i]` belonging to page `i + 1`
    pub fn detect_page_orientation(&self, document: Document) -> Result<Vec<Verdict>> {
        let report = self.detect_with(document, &CancellationToken::new(), &NoProgress)?;
        Ok(report.verdicts())
    }

    /// Verdicts tagged with page numbers, reporting progress as pages finish
    pub fn detect_with_progress(
        &self,
        document: Document,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<PageVerdict>> {
        let report = self.detect_with(document, &CancellationToken::new(), progress)?;
        Ok(report.pages)
    }

    /// Full detection run with external cancellation
    pub fn detect_with(
        &self,
        document: Document,
        cancel: &CancellationToken,
        progress: &dyn ProgressCallback,
    ) -> Result<DetectionReport> {
        let start = Instant::now();

        progress.on_stage_start(ProcessingStage::Loading, 0);
        let pages = self.pages(document)?;
        progress.on_debug(&format!("{} page(s) loaded", pages.len()));

        let dispatch = self
            .dispatcher
            .dispatch_with(pages, &*self.classifier, cancel, progress)?;

        let summary = VerdictTally::from_verdicts(&dispatch.verdicts);
        let elapsed = start.elapsed().as_secs_f64();
        progress.on_stage_start(ProcessingStage::Completed, summary.total());
        info!(
            pages = summary.total(),
            upside_down = summary.upside_down,
            undetectable = summary.undetectable,
            elapsed_secs = elapsed,
            "detection finished"
        );

        Ok(DetectionReport {
            generated_at: Local::now(),
            config: self.config().clone(),
            workers: dispatch.workers,
            elapsed_seconds: elapsed,
            summary,
            pages: dispatch.verdicts,
        })
    }

    /// Write every page of `document` as PNG into `output_dir`, rotated upright
    /// according to `verdicts`
    ///
    /// Files are named `page-0001.png`, `page-0002.png`, ...
    pub fn write_corrected(
        &self,
        document: Document,
        verdicts: &[PageVerdict],
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<PathBuf>> {
        let pages = self.pages(document)?;
        if pages.len() != verdicts.len() {
            return Err(OrientError::InvalidInput(format!(
                "document has {} pages but {} verdicts were given",
                pages.len(),
                verdicts.len()
            )));
        }

        std::fs::create_dir_all(output_dir)?;
        progress.on_stage_start(ProcessingStage::Writing, pages.len());

        let mut written = Vec::with_capacity(pages.len());
        for (page, pv) in pages.into_iter().zip(verdicts) {
            let number = page.number;
            let corrected = correct_page(page.image, pv.verdict).map_err(|e| e.on_page(number))?;
            let path = output_dir.join(format!("page-{:04}.png", number));
            corrected
                .save_with_format(&path, ImageFormat::Png)
                .map_err(|e| std::io::Error::other(format!("{}: {}", path.display(), e)))?;
            debug!(page = number, verdict = %pv.verdict, path = %path.display(), "page written");
            written.push(path);
        }
        Ok(written)
    }
}

/// Rotate a page raster upright according to its verdict
///
/// `Correct` and `Undetectable` pages come back unchanged; color is kept and
/// 1-bit pages are expanded to 8-bit grayscale.
pub fn correct_page(image: PageImage, verdict: Verdict) -> Result<DynamicImage> {
    let image = match image {
        PageImage::Pixels(img) => img,
        bilevel => match PaletteRasterAdapter::new().normalize_depth(bilevel, BitDepth::Eight)? {
            PageImage::Pixels(img) => img,
            PageImage::Bilevel(_) => {
                return Err(OrientError::UnsupportedFormat(
                    "bilevel page could not be expanded".to_string(),
                ))
            }
        },
    };

    Ok(match verdict.correction_degrees() {
        Some(90) => image.rotate90(),
        Some(180) => image.rotate180(),
        Some(270) => image.rotate270(),
        _ => image,
    })
}
