//! Error types for orientation detection
//!
//! Every failure below aborts the processing of the whole document. The only
//! per-page outcome that is not an error is a page without recognizable text
//! structure, which the classifier reports as [`Verdict::Undetectable`].
//!
//! [`Verdict::Undetectable`]: crate::Verdict::Undetectable

use std::fmt;
use thiserror::Error;

/// Pipeline stage in which a recognizer call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Full-page layout/orientation analysis
    LayoutAnalysis,
    /// First confidence pass on the working image
    FirstPass,
    /// Second confidence pass on the rotated working image
    SecondPass,
}

impl Stage {
    /// Short name used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            Stage::LayoutAnalysis => "layout analysis",
            Stage::FirstPass => "first pass",
            Stage::SecondPass => "second pass",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Orientation detection error types
#[derive(Debug, Error)]
pub enum OrientError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Recognizer failed{} during {stage}: {message}", page_suffix(.page))]
    RecognizerFailure {
        /// Page number (1-based), once known
        page: Option<u32>,
        /// Stage that issued the failing call
        stage: Stage,
        message: String,
    },

    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn page_suffix(page: &Option<u32>) -> String {
    match page {
        Some(page) => format!(" on page {}", page),
        None => String::new(),
    }
}

fn with_page_prefix(page_number: u32, msg: String) -> String {
    let prefix = format!("page {}: ", page_number);
    if msg.starts_with(&prefix) {
        msg
    } else {
        prefix + &msg
    }
}

impl OrientError {
    /// Recognizer failure not yet attributed to a page
    pub fn recognizer(stage: Stage, message: impl Into<String>) -> Self {
        OrientError::RecognizerFailure {
            page: None,
            stage,
            message: message.into(),
        }
    }

    /// Attach a page number to errors that carry one
    pub fn on_page(self, page_number: u32) -> Self {
        match self {
            OrientError::RecognizerFailure { stage, message, .. } => {
                OrientError::RecognizerFailure {
                    page: Some(page_number),
                    stage,
                    message,
                }
            }
            OrientError::InvalidInput(msg) => {
                OrientError::InvalidInput(with_page_prefix(page_number, msg))
            }
            OrientError::UnsupportedFormat(msg) => {
                OrientError::UnsupportedFormat(with_page_prefix(page_number, msg))
            }
            other => other,
        }
    }

    /// Re-tag a recognizer failure with the stage that issued the call
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            OrientError::RecognizerFailure { page, message, .. } => {
                OrientError::RecognizerFailure {
                    page,
                    stage,
                    message,
                }
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizer_failure_display_without_page() {
        let err = OrientError::recognizer(Stage::LayoutAnalysis, "exit status 1");
        assert_eq!(
            err.to_string(),
            "Recognizer failed during layout analysis: exit status 1"
        );
    }

    #[test]
    fn test_on_page_attaches_page_number() {
        let err = OrientError::recognizer(Stage::FirstPass, "boom").on_page(7);
        assert!(matches!(
            err,
            OrientError::RecognizerFailure {
                page: Some(7),
                stage: Stage::FirstPass,
                ..
            }
        ));
        assert!(err.to_string().contains("on page 7"));
    }

    #[test]
    fn test_at_stage_retags() {
        let err = OrientError::recognizer(Stage::FirstPass, "x").at_stage(Stage::SecondPass);
        assert!(err.to_string().contains("second pass"));
    }

    #[test]
    fn test_on_page_leaves_invariant_errors_alone() {
        let err = OrientError::InternalInvariantViolation("dup".into()).on_page(3);
        assert_eq!(err.to_string(), "Internal invariant violated: dup");
    }

    #[test]
    fn test_on_page_prefix_applied_once() {
        let err = OrientError::InvalidInput("empty".into()).on_page(2).on_page(2);
        assert_eq!(err.to_string(), "Invalid input: page 2: empty");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: OrientError = std::io::Error::other("disk").into();
        assert!(err.to_string().contains("IO error"));
    }
}
