//! Tesseract CLI recognizer
//!
//! Each call writes the image to a temporary PNG and runs
//! `tesseract <png> stdout -l <lang> --psm <n> tsv`, then parses the TSV.

use super::tsv::parse_tsv;
use super::{RecognitionMode, Recognizer};
use crate::error::{OrientError, Result, Stage};
use crate::layout::LayoutResult;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Page segmentation mode with orientation and script detection
const PSM_AUTO_OSD: u8 = 1;

/// Fully automatic page segmentation, no orientation detection
const PSM_AUTO: u8 = 3;

/// Options for [`TesseractRecognizer`]
#[derive(Debug, Clone, PartialEq)]
pub struct TesseractOptions {
    /// Explicit binary path; searched on `PATH` when unset
    pub tesseract_path: Option<PathBuf>,
    /// Language/model selector passed as `-l`
    pub language: String,
    /// Directory holding `*.traineddata`
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractOptions {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            language: DEFAULT_LANGUAGE.to_string(),
            tessdata_dir: None,
        }
    }
}

impl TesseractOptions {
    /// Create a new options builder
    pub fn builder() -> TesseractOptionsBuilder {
        TesseractOptionsBuilder::default()
    }
}

/// Builder for TesseractOptions
#[derive(Debug, Default)]
pub struct TesseractOptionsBuilder {
    options: TesseractOptions,
}

impl TesseractOptionsBuilder {
    /// Set the tesseract binary path
    #[must_use]
    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.tesseract_path = Some(path.into());
        self
    }

    /// Set the recognition language (e.g. "eng", "deu+eng")
    #[must_use]
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.options.language = lang.into();
        self
    }

    /// Set the tessdata directory
    #[must_use]
    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.tessdata_dir = Some(dir.into());
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> TesseractOptions {
        self.options
    }
}

/// Recognizer backed by the `tesseract` command-line tool
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
    options: TesseractOptions,
}

impl TesseractRecognizer {
    /// Resolve the tesseract binary and create the recognizer
    pub fn new(options: TesseractOptions) -> Result<Self> {
        let binary = match &options.tesseract_path {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                return Err(OrientError::Config(format!(
                    "tesseract binary not found at {}",
                    path.display()
                )))
            }
            None => which::which("tesseract").map_err(|_| {
                OrientError::Config("tesseract not found on PATH".to_string())
            })?,
        };

        if options.language.trim().is_empty() {
            return Err(OrientError::Config(
                "recognition language must not be empty".to_string(),
            ));
        }

        Ok(Self { binary, options })
    }

    /// Path of the resolved binary
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn options(&self) -> &TesseractOptions {
        &self.options
    }

    /// Arguments following the input image path
    fn arguments(&self, mode: RecognitionMode) -> Vec<String> {
        let psm = match mode {
            RecognitionMode::Layout => PSM_AUTO_OSD,
            RecognitionMode::Text => PSM_AUTO,
        };

        let mut args = vec![
            "stdout".to_string(),
            "-l".to_string(),
            self.options.language.clone(),
            "--psm".to_string(),
            psm.to_string(),
        ];
        if let Some(dir) = &self.options.tessdata_dir {
            args.push("--tessdata-dir".to_string());
            args.push(dir.display().to_string());
        }
        args.push("tsv".to_string());
        args
    }
}

fn stage_for(mode: RecognitionMode) -> Stage {
    match mode {
        RecognitionMode::Layout => Stage::LayoutAnalysis,
        RecognitionMode::Text => Stage::FirstPass,
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> Result<LayoutResult> {
        let stage = stage_for(mode);

        let mut input = tempfile::Builder::new()
            .prefix("page-orient-")
            .suffix(".png")
            .tempfile()?;
        image
            .write_to(input.as_file_mut(), ImageFormat::Png)
            .map_err(|e| OrientError::recognizer(stage, format!("failed to encode page: {}", e)))?;

        let args = self.arguments(mode);
        trace!(binary = %self.binary.display(), ?args, "running tesseract");

        let output = Command::new(&self.binary)
            .arg(input.path())
            .args(&args)
            .output()
            .map_err(|e| {
                OrientError::recognizer(stage, format!("failed to run tesseract: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OrientError::recognizer(
                stage,
                format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let layout = parse_tsv(&stdout).map_err(|e| OrientError::recognizer(stage, e.to_string()))?;

        debug!(
            ?mode,
            width = image.width(),
            height = image.height(),
            blocks = layout.blocks.len(),
            confidence = layout.mean_confidence,
            "tesseract pass complete"
        );
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer_with(options: TesseractOptions) -> TesseractRecognizer {
        TesseractRecognizer {
            binary: PathBuf::from("/usr/bin/tesseract"),
            options,
        }
    }

    #[test]
    fn test_options_default() {
        let opts = TesseractOptions::default();
        assert_eq!(opts.language, "eng");
        assert!(opts.tesseract_path.is_none());
        assert!(opts.tessdata_dir.is_none());
    }

    #[test]
    fn test_options_builder() {
        let opts = TesseractOptions::builder()
            .language("deu+eng")
            .tessdata_dir("/opt/tessdata")
            .tesseract_path("/opt/bin/tesseract")
            .build();
        assert_eq!(opts.language, "deu+eng");
        assert_eq!(opts.tessdata_dir, Some(PathBuf::from("/opt/tessdata")));
        assert_eq!(opts.tesseract_path, Some(PathBuf::from("/opt/bin/tesseract")));
    }

    #[test]
    fn test_layout_arguments_use_osd() {
        let rec = recognizer_with(TesseractOptions::default());
        let args = rec.arguments(RecognitionMode::Layout);
        assert_eq!(args, vec!["stdout", "-l", "eng", "--psm", "1", "tsv"]);
    }

    #[test]
    fn test_text_arguments_with_tessdata() {
        let rec = recognizer_with(TesseractOptions::builder().tessdata_dir("/td").build());
        let args = rec.arguments(RecognitionMode::Text);
        assert_eq!(
            args,
            vec!["stdout", "-l", "eng", "--psm", "3", "--tessdata-dir", "/td", "tsv"]
        );
    }

    #[test]
    fn test_missing_explicit_binary() {
        let opts = TesseractOptions::builder()
            .tesseract_path("/nonexistent/tesseract")
            .build();
        let result = TesseractRecognizer::new(opts);
        assert!(matches!(result, Err(OrientError::Config(_))));
    }

    #[test]
    fn test_stage_for_mode() {
        assert_eq!(stage_for(RecognitionMode::Layout), Stage::LayoutAnalysis);
        assert_eq!(stage_for(RecognitionMode::Text), Stage::FirstPass);
    }

    #[cfg(unix)]
    fn fake_tesseract(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("tesseract");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_recognize_parses_tool_output() {
        let dir = tempfile::tempdir().unwrap();
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t80\tHello\n\
                   5\t1\t1\t1\t1\t2\t12\t0\t10\t10\t60\tworld";
        let binary = fake_tesseract(dir.path(), &format!("printf '{}'", tsv));
        let opts = TesseractOptions::builder().tesseract_path(binary).build();
        let rec = TesseractRecognizer::new(opts).unwrap();

        let img = DynamicImage::new_luma8(4, 4);
        let layout = rec.recognize(&img, RecognitionMode::Text).unwrap();
        assert_eq!(layout.word_count(), 2);
        assert!((layout.mean_confidence - 0.70).abs() < 1e-6);
    }

    #[cfg(unix)]
    #[test]
    fn test_recognize_nonzero_exit_is_recognizer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_tesseract(dir.path(), "echo 'bad language' >&2; exit 1");
        let opts = TesseractOptions::builder().tesseract_path(binary).build();
        let rec = TesseractRecognizer::new(opts).unwrap();

        let img = DynamicImage::new_luma8(4, 4);
        match rec.recognize(&img, RecognitionMode::Layout) {
            Err(OrientError::RecognizerFailure { stage, message, .. }) => {
                assert_eq!(stage, Stage::LayoutAnalysis);
                assert!(message.contains("bad language"));
            }
            other => panic!("expected recognizer failure, got {:?}", other),
        }
    }
}
