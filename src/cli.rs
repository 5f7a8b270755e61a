//! CLI interface module
//!
//! Provides command-line argument parsing using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
    pub const RECOGNIZER_ERROR: i32 = 4;
}

/// Page orientation detection for scanned documents
#[derive(Parser, Debug)]
#[command(name = "page-orient")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the orientation of every page in a document
    Detect(DetectArgs),
    /// Show system information
    Info,
}

/// Output format for verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per page
    #[default]
    Text,
    /// JSON report
    Json,
}

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Multi-page TIFF, single image, or directory of images
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Recognizer language, e.g. "eng" or "eng+deu"
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Number of worker threads (default: CPU count)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,

    /// Only process the first N pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Configuration file (default: ./page-orient.toml or user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the tesseract binary
    #[arg(long)]
    pub tesseract: Option<PathBuf>,

    /// Tesseract language data directory
    #[arg(long)]
    pub tessdata: Option<PathBuf>,

    /// Save every page as PNG into DIR, upside-down pages rotated
    #[arg(long, value_name = "DIR")]
    pub write_corrected: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress and summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_detect_defaults() {
        let cli = Cli::try_parse_from(["page-orient", "detect", "scan.tiff"]).unwrap();
        let Commands::Detect(args) = cli.command else {
            panic!("expected detect");
        };
        assert_eq!(args.input, PathBuf::from("scan.tiff"));
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.lang.is_none());
        assert!(args.threads.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_detect_all_options() {
        let cli = Cli::try_parse_from([
            "page-orient",
            "detect",
            "pages/",
            "--lang",
            "eng+fra",
            "--threads",
            "4",
            "--max-pages",
            "12",
            "--format",
            "json",
            "--tesseract",
            "/opt/bin/tesseract",
            "--tessdata",
            "/opt/tessdata",
            "--write-corrected",
            "out",
            "-vv",
        ])
        .unwrap();
        let Commands::Detect(args) = cli.command else {
            panic!("expected detect");
        };
        assert_eq!(args.lang.as_deref(), Some("eng+fra"));
        assert_eq!(args.threads, Some(4));
        assert_eq!(args.max_pages, Some(12));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.tesseract, Some(PathBuf::from("/opt/bin/tesseract")));
        assert_eq!(args.write_corrected, Some(PathBuf::from("out")));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = Cli::try_parse_from(["page-orient", "detect", "a.tif", "--threads", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["page-orient", "detect", "a.tif", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::try_parse_from(["page-orient", "info"]).unwrap();
        assert!(matches!(cli.command, Commands::Info));
    }

    #[test]
    fn test_missing_input_rejected() {
        assert!(Cli::try_parse_from(["page-orient", "detect"]).is_err());
    }
}
