//! page-orient - Page orientation detection for scanned documents
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use page_orient::{
    exit_codes,
    // CLI
    Cli, Commands, DetectArgs, OutputFormat,
    // Config
    CliOverrides, Config,
    // Pipeline
    CancellationToken, DetectionReport, Document, OrientError, OrientationPipeline,
    // Progress
    OutputMode, ProcessingStage, ProgressCallback, Verdict,
};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

/// Map an error to the process exit code
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<OrientError>() {
        Some(OrientError::Config(_)) => exit_codes::INVALID_ARGS,
        Some(OrientError::RecognizerFailure { .. }) => exit_codes::RECOGNIZER_ERROR,
        _ => exit_codes::GENERAL_ERROR,
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `-v`
fn init_logging(mode: OutputMode) {
    let default_level = match mode {
        OutputMode::Quiet => "error",
        OutputMode::Normal => "warn",
        OutputMode::Verbose => "info",
        OutputMode::VeryVerbose => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============ Progress Callback Implementation ============

/// Progress bar on stderr, one tick per finished page
struct BarProgress {
    bar: ProgressBar,
    mode: OutputMode,
}

impl BarProgress {
    fn new(mode: OutputMode) -> Self {
        let bar = if mode.should_show(OutputMode::Normal) {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg:10} [{bar:40}] {pos}/{len} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar, mode }
    }
}

impl ProgressCallback for BarProgress {
    fn on_stage_start(&self, stage: ProcessingStage, total: usize) {
        match stage {
            ProcessingStage::Loading => {
                self.bar.set_message(stage.name());
                self.bar.enable_steady_tick(Duration::from_millis(120));
            }
            ProcessingStage::Detecting | ProcessingStage::Writing => {
                self.bar.set_message(stage.name());
                self.bar.set_length(total as u64);
                self.bar.set_position(0);
            }
            ProcessingStage::Completed => self.bar.finish_and_clear(),
        }
    }

    fn on_page_complete(
        &self,
        page_number: u32,
        verdict: Verdict,
        completed: usize,
        _total: usize,
    ) {
        self.bar.set_position(completed as u64);
        if self.mode.should_show(OutputMode::Verbose) {
            self.bar.println(format!("  page {}: {}", page_number, verdict));
        }
    }

    fn on_debug(&self, message: &str) {
        if self.mode.should_show(OutputMode::VeryVerbose) {
            self.bar.println(format!("  [DEBUG] {}", message));
        }
    }
}

// ============ Detect Command ============

fn run_detect(args: &DetectArgs) -> anyhow::Result<()> {
    let mode = if args.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::from_verbosity(args.verbose)
    };
    init_logging(mode);

    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let file_config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("ignoring config file: {}", e);
            Config::default()
        }),
    };
    let pipeline_config = file_config.merge_with_cli(&create_cli_overrides(args));

    let pipeline = match OrientationPipeline::new(pipeline_config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error: Recognizer unavailable: {}", e);
            std::process::exit(exit_codes::RECOGNIZER_ERROR);
        }
    };

    let progress = BarProgress::new(mode);
    let report = pipeline
        .detect_with(
            Document::path(&args.input),
            &CancellationToken::new(),
            &progress,
        )
        .with_context(|| format!("failed to process {}", args.input.display()))?;
    progress.bar.finish_and_clear();

    match args.format {
        OutputFormat::Text => print_text(&report, mode),
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
    }

    if let Some(dir) = &args.write_corrected {
        let progress = BarProgress::new(mode);
        let written = pipeline
            .write_corrected(Document::path(&args.input), &report.pages, dir, &progress)
            .with_context(|| format!("failed to write corrected pages to {}", dir.display()))?;
        progress.bar.finish_and_clear();
        if mode.should_show(OutputMode::Normal) && args.format == OutputFormat::Text {
            println!("Wrote {} page(s) to {}", written.len(), dir.display());
        }
    }

    Ok(())
}

/// Only explicitly given flags override the config file
fn create_cli_overrides(args: &DetectArgs) -> CliOverrides {
    CliOverrides {
        language: args.lang.clone(),
        tesseract_path: args.tesseract.clone(),
        tessdata_dir: args.tessdata.clone(),
        threads: args.threads.map(usize::from),
        max_pages: args.max_pages,
    }
}

fn print_text(report: &DetectionReport, mode: OutputMode) {
    for pv in &report.pages {
        println!("{}\t{}", pv.page_number, pv.verdict);
    }
    if mode.should_show(OutputMode::Normal) {
        report.summary.print_summary(report.elapsed_seconds);
    }
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("page-orient v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("Recognizer:");
    check_tool_with_version("tesseract", "Tesseract", &["--version"]);

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let state = if path.is_file() { "found" } else { "absent" };
        println!("  {} ({})", path.display(), state);
    }

    Ok(())
}

fn check_tool_with_version(cmd: &str, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => {
            // tesseract prints its version on stdout or stderr depending on build
            let version = std::process::Command::new(&path)
                .args(version_args)
                .output()
                .ok()
                .and_then(|output| {
                    let text = if output.stdout.is_empty() {
                        String::from_utf8_lossy(&output.stderr).into_owned()
                    } else {
                        String::from_utf8_lossy(&output.stdout).into_owned()
                    };
                    text.lines().next().map(|line| line.trim().to_string())
                })
                .filter(|line| !line.is_empty() && line.len() < 80);
            match version {
                Some(version) => println!("  {}: {} ({})", name, version, path.display()),
                None => println!("  {}: {} (found)", name, path.display()),
            }
        }
        Err(_) => println!("  {}: Not found", name),
    }
}
