//! Progress reporting for orientation detection.
//!
//! Workers report each finished page through [`ProgressCallback`]; callers
//! decide how to render it (progress bar, log lines, nothing).

use crate::page::{PageVerdict, Verdict};
use serde::Serialize;
use std::fmt;

/// Processing stages of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingStage {
    /// Splitting the document into pages
    #[default]
    Loading,
    /// Classifying pages
    Detecting,
    /// Writing corrected pages
    Writing,
    /// Completed
    Completed,
}

impl ProcessingStage {
    /// Get the name of the stage
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingStage::Loading => "Loading",
            ProcessingStage::Detecting => "Detecting",
            ProcessingStage::Writing => "Writing",
            ProcessingStage::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Normal output (verdicts and summary)
    #[default]
    Normal,
    /// Verbose output (progress bar, per-page timing)
    Verbose,
    /// Very verbose (debug messages)
    VeryVerbose,
}

impl OutputMode {
    /// Create OutputMode from verbosity level
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

/// Receives progress events; called concurrently from worker threads
pub trait ProgressCallback: Send + Sync {
    /// A stage begins; `total` is the page count when known
    fn on_stage_start(&self, _stage: ProcessingStage, _total: usize) {}

    /// A page has been classified; `completed` counts finished pages so far
    fn on_page_complete(
        &self,
        _page_number: u32,
        _verdict: Verdict,
        _completed: usize,
        _total: usize,
    ) {
    }

    /// Free-form debug message
    fn on_debug(&self, _message: &str) {}
}

/// Progress callback that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {}

/// Per-verdict page counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerdictTally {
    pub correct: usize,
    pub upside_down: usize,
    pub rotated: usize,
    pub undetectable: usize,
}

impl VerdictTally {
    /// Count verdicts
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a PageVerdict>) -> Self {
        let mut tally = Self::default();
        for pv in verdicts {
            match pv.verdict {
                Verdict::Correct => tally.correct += 1,
                Verdict::UpsideDown => tally.upside_down += 1,
                Verdict::RotatedLeft | Verdict::RotatedRight => tally.rotated += 1,
                Verdict::Undetectable => tally.undetectable += 1,
            }
        }
        tally
    }

    /// Total pages counted
    pub fn total(&self) -> usize {
        self.correct + self.upside_down + self.rotated + self.undetectable
    }

    /// Print final summary
    pub fn print_summary(&self, elapsed_secs: f64) {
        println!();
        println!("{}", "=".repeat(60));
        println!("Orientation Summary");
        println!("{}", "=".repeat(60));
        println!("  Pages:         {}", self.total());
        println!("  Correct:       {}", self.correct);
        println!("  Upside down:   {}", self.upside_down);
        if self.rotated > 0 {
            println!("  Rotated 90°:   {}", self.rotated);
        }
        println!("  Undetectable:  {}", self.undetectable);
        println!("  Elapsed:       {:.2}s", elapsed_secs);
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stage_name() {
        assert_eq!(ProcessingStage::Loading.name(), "Loading");
        assert_eq!(ProcessingStage::Detecting.name(), "Detecting");
        assert_eq!(ProcessingStage::Writing.name(), "Writing");
        assert_eq!(ProcessingStage::Completed.to_string(), "Completed");
        assert_eq!(ProcessingStage::default(), ProcessingStage::Loading);
    }

    #[test]
    fn test_output_mode_from_verbosity() {
        assert_eq!(OutputMode::from_verbosity(0), OutputMode::Normal);
        assert_eq!(OutputMode::from_verbosity(1), OutputMode::Verbose);
        assert_eq!(OutputMode::from_verbosity(2), OutputMode::VeryVerbose);
        assert_eq!(OutputMode::from_verbosity(10), OutputMode::VeryVerbose);
    }

    #[test]
    fn test_output_mode_quiet() {
        let mode = OutputMode::Quiet;
        assert!(!mode.should_show(OutputMode::Quiet));
        assert!(!mode.should_show(OutputMode::Normal));
        assert!(!mode.should_show(OutputMode::Verbose));
    }

    #[test]
    fn test_output_mode_normal() {
        let mode = OutputMode::Normal;
        assert!(mode.should_show(OutputMode::Normal));
        assert!(!mode.should_show(OutputMode::Verbose));
        assert!(!mode.should_show(OutputMode::VeryVerbose));
    }

    #[test]
    fn test_output_mode_verbose() {
        let mode = OutputMode::Verbose;
        assert!(mode.should_show(OutputMode::Verbose));
        assert!(!mode.should_show(OutputMode::VeryVerbose));
    }

    #[test]
    fn test_verdict_tally() {
        let verdicts = [
            PageVerdict {
                page_number: 1,
                verdict: Verdict::Correct,
            },
            PageVerdict {
                page_number: 2,
                verdict: Verdict::UpsideDown,
            },
            PageVerdict {
                page_number: 3,
                verdict: Verdict::Correct,
            },
            PageVerdict {
                page_number: 4,
                verdict: Verdict::Undetectable,
            },
        ];
        let tally = VerdictTally::from_verdicts(&verdicts);
        assert_eq!(tally.correct, 2);
        assert_eq!(tally.upside_down, 1);
        assert_eq!(tally.undetectable, 1);
        assert_eq!(tally.rotated, 0);
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn test_no_progress_accepts_events() {
        let progress = NoProgress;
        progress.on_stage_start(ProcessingStage::Detecting, 3);
        progress.on_page_complete(1, Verdict::Correct, 1, 3);
        progress.on_debug("ignored");
    }
}
