//! CLI entry point for the open-tasks scanner.
//!
//! This binary finds open tasks (`FIXME`, `TODO`, ...) in a source tree and
//! prints them as text, JSON or CSV.
//!
//! # Usage
//!
//! ```bash
//! open-tasks [OPTIONS] <COMMAND>
//!
//! # Scan the current directory with the default tags
//! open-tasks scan
//!
//! # Scan Java sources only, in this process, as JSON
//! open-tasks scan --root src --include '**/*.java' --in-process --format json
//!
//! # Check a tag configuration against an example line
//! open-tasks validate '// TODO: fix this' --normal TODO
//! ```
//!
//! Exits with 130 when a scan is interrupted with Ctrl-C.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::fmt::Write as _;
use std::io::Write;
use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use ot_core::{Config, Report, TagsConfig};
use ot_remote::{OpenTasks, ProcessExecutor, ScanFailure, TaskScanner};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code of an interrupted scan.
const EXIT_CANCELLED: u8 = 130;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Finds open tasks such as `FIXME` and `TODO` comments in a source tree.
#[derive(Parser)]
#[command(name = "open-tasks", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file; command-line options override its values.
    #[arg(short, long, global = true, env = "OPEN_TASKS_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree for open tasks.
    Scan(ScanArgs),

    /// Check a tag configuration against an example text.
    Validate {
        /// Example text, typically one commented line holding one task.
        sample: String,

        #[command(flatten)]
        tags: TagArgs,
    },

    /// Check a comma-separated file-set pattern.
    CheckPattern {
        /// Patterns such as `**/*.rs, docs/`.
        pattern: String,
    },

    /// Serve one scan request over stdin/stdout.
    #[command(hide = true)]
    Worker,
}

/// Tag identifiers and matching flags.
#[derive(Args, Debug, Default)]
struct TagArgs {
    /// Identifiers of the high tier.
    #[arg(long)]
    high: Option<String>,

    /// Identifiers of the normal tier.
    #[arg(long)]
    normal: Option<String>,

    /// Identifiers of the low tier.
    #[arg(long)]
    low: Option<String>,

    /// Match identifiers regardless of casing.
    #[arg(short, long)]
    ignore_case: bool,

    /// Match identifiers with their exact casing.
    #[arg(long, conflicts_with = "ignore_case")]
    case_sensitive: bool,

    /// Treat each tier as a regular expression.
    #[arg(short, long)]
    regex: bool,

    /// Treat each tier as a list of literal identifiers.
    #[arg(long, conflicts_with = "regex")]
    literal: bool,
}

impl TagArgs {
    /// Applies the given options on top of `tags`.
    fn apply(&self, tags: &mut TagsConfig) {
        if let Some(high) = &self.high {
            tags.high.clone_from(high);
        }
        if let Some(normal) = &self.normal {
            tags.normal.clone_from(normal);
        }
        if let Some(low) = &self.low {
            tags.low.clone_from(low);
        }
        if self.ignore_case {
            tags.ignore_case = true;
        } else if self.case_sensitive {
            tags.ignore_case = false;
        }
        if self.regex {
            tags.regex = true;
        } else if self.literal {
            tags.regex = false;
        }
    }
}

/// Options of the `scan` command.
#[derive(Args, Debug)]
struct ScanArgs {
    /// Directory to scan.
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    #[command(flatten)]
    tags: TagArgs,

    /// Comma-separated globs of files to scan.
    #[arg(long)]
    include: Option<String>,

    /// Comma-separated globs of files to leave out.
    #[arg(long)]
    exclude: Option<String>,

    /// Encoding of the source files.
    #[arg(long)]
    encoding: Option<String>,

    /// Size of the scanning pool (defaults to all cores).
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Scan inside this process instead of a worker process.
    #[arg(long, conflicts_with = "worker")]
    in_process: bool,

    /// Worker program (defaults to this executable).
    #[arg(long)]
    worker: Option<Utf8PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Output file (defaults to stdout).
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,
}

impl ScanArgs {
    /// Applies the given options on top of `config`.
    fn apply(&self, config: &mut Config) {
        self.tags.apply(&mut config.tags);
        if let Some(include) = &self.include {
            config.files.include.clone_from(include);
        }
        if let Some(exclude) = &self.exclude {
            config.files.exclude.clone_from(exclude);
        }
        if let Some(encoding) = &self.encoding {
            config.files.encoding.clone_from(encoding);
        }
        if self.threads.is_some() {
            config.worker.threads = self.threads;
        }
        if self.in_process {
            config.worker.in_process = true;
        }
        if let Some(worker) = &self.worker {
            config.worker.in_process = false;
            config.worker.program = Some(worker.clone());
        }
    }
}

/// Report output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    /// One line per task.
    Text,
    /// JSON format.
    Json,
    /// CSV format.
    Csv,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs go
/// to stderr so stdout carries only reports and worker responses.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},ignore=warn,globset=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Loads the configuration file, or the defaults when none is given.
fn load_config(path: Option<&Utf8Path>) -> color_eyre::Result<Config> {
    match path {
        Some(path) => {
            info!(path = %path, "Loading configuration");
            Config::load(path).wrap_err_with(|| format!("Failed to load configuration {path}"))
        }
        None => Ok(Config::default()),
    }
}

/// Returns a token cancelled on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling scan");
            token.cancel();
        }
    });
    cancel
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a scan and writes its report.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the scan fails or the
/// report cannot be written. An interrupted scan is not an error.
async fn run_scan(mut config: Config, args: &ScanArgs) -> color_eyre::Result<ExitCode> {
    args.apply(&mut config);
    config.validate()?;
    let request = config.to_request()?;

    info!(root = %args.root, in_process = config.worker.in_process, "Starting scan");

    let cancel = cancel_on_interrupt();
    let result = if config.worker.in_process {
        OpenTasks::in_process()
            .with_threads(config.worker.threads)
            .scan(request, &args.root, cancel)
            .await
    } else {
        let executor = match &config.worker.program {
            Some(program) => ProcessExecutor::new(program.clone()),
            None => ProcessExecutor::current_exe()?,
        };
        OpenTasks::new(executor)
            .with_threads(config.worker.threads)
            .scan(request, &args.root, cancel)
            .await
    };

    let report = match result {
        Ok(report) => report,
        Err(ScanFailure::Cancelled) => {
            warn!("Scan cancelled");
            return Ok(ExitCode::from(EXIT_CANCELLED));
        }
        Err(failure) => return Err(failure.into()),
    };

    let content = match args.format {
        ReportFormat::Text => render_text(&report),
        ReportFormat::Json => serde_json::to_string_pretty(&report)
            .map(|json| json + "\n")
            .map_err(|e| eyre!("Failed to serialize JSON: {}", e))?,
        ReportFormat::Csv => render_csv(&report),
    };

    if let Some(output_path) = &args.output {
        std::fs::write(output_path.as_std_path(), &content)
            .wrap_err_with(|| format!("Failed to write {output_path}"))?;
        info!(path = %output_path, "Report written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{content}")?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Prints what a tag configuration finds in `sample`.
fn run_validate(mut config: Config, sample: &str, tags: &TagArgs) -> color_eyre::Result<ExitCode> {
    tags.apply(&mut config.tags);

    let outcome = OpenTasks::in_process().validate(sample, &config.tags.to_tag_config());

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{outcome}")?;

    Ok(if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Checks a file-set pattern.
fn run_check_pattern(pattern: &str) -> color_eyre::Result<ExitCode> {
    ot_scanner::check_pattern(pattern)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "pattern is valid")?;
    Ok(ExitCode::SUCCESS)
}

/// Serves one request of the worker protocol.
async fn run_worker() -> color_eyre::Result<ExitCode> {
    let cancel = cancel_on_interrupt();
    ot_remote::run_worker(tokio::io::stdin(), tokio::io::stdout(), cancel)
        .await
        .wrap_err("Worker failed to exchange with its caller")?;
    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Renders a report as one line per task followed by a summary.
fn render_text(report: &Report) -> String {
    let mut output = String::new();

    for task in report.tasks() {
        let _ = writeln!(output, "{task}");
    }

    if !report.skipped().is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Skipped files ({}):", report.skipped().len());
        for skipped in report.skipped() {
            let _ = writeln!(output, "  {} - {}", skipped.path, skipped.reason);
        }
    }

    let summary = report.summary();
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} tasks ({} high, {} normal, {} low) in {} files, {} skipped",
        summary.total_tasks(),
        summary.high,
        summary.normal,
        summary.low,
        summary.files_scanned,
        summary.files_skipped,
    );

    output
}

/// Renders the tasks of a report as CSV.
fn render_csv(report: &Report) -> String {
    let mut output = String::from("path,line,priority,tag,message\n");

    for task in report.tasks() {
        let _ = writeln!(
            output,
            "{},{},{},{},{}",
            escape_csv(task.path.as_str()),
            task.line,
            task.priority.label(),
            escape_csv(&task.tag),
            escape_csv(&task.message),
        );
    }

    output
}

/// Escapes a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (stderr only; stdout is for reports)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to appropriate command
    match &cli.command {
        Commands::Scan(args) => {
            let config = load_config(cli.config.as_deref())?;
            run_scan(config, args).await
        }
        Commands::Validate { sample, tags } => {
            let config = load_config(cli.config.as_deref())?;
            run_validate(config, sample, tags)
        }
        Commands::CheckPattern { pattern } => run_check_pattern(pattern),
        Commands::Worker => run_worker().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ot_core::{Priority, SkippedFile, TaskRecord};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_options_override_config() {
        let cli = Cli::parse_from([
            "open-tasks",
            "scan",
            "--root",
            "src",
            "--normal",
            "TODO,XXX",
            "--ignore-case",
            "--include",
            "**/*.java",
            "--threads",
            "2",
            "--in-process",
            "--format",
            "csv",
        ]);
        let Commands::Scan(args) = cli.command else {
            unreachable!("parsed a scan command");
        };

        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(args.root, "src");
        assert_eq!(config.tags.high, "FIXME");
        assert_eq!(config.tags.normal, "TODO,XXX");
        assert!(config.tags.ignore_case);
        assert!(!config.tags.regex);
        assert_eq!(config.files.include, "**/*.java");
        assert_eq!(config.worker.threads, Some(2));
        assert!(config.worker.in_process);
        assert!(matches!(args.format, ReportFormat::Csv));
    }

    #[test]
    fn test_worker_option_selects_process() {
        let cli = Cli::parse_from(["open-tasks", "scan", "--worker", "/opt/ot/open-tasks"]);
        let Commands::Scan(args) = cli.command else {
            unreachable!("parsed a scan command");
        };

        let mut config = Config::default();
        config.worker.in_process = true;
        args.apply(&mut config);

        assert!(!config.worker.in_process);
        assert_eq!(config.worker.program.as_deref(), Some(Utf8Path::new("/opt/ot/open-tasks")));
    }

    #[test]
    fn test_in_process_conflicts_with_worker() {
        let parsed = Cli::try_parse_from(["open-tasks", "scan", "--in-process", "--worker", "w"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_keeps_config_tiers() {
        let cli = Cli::parse_from(["open-tasks", "validate", "// XXX: later", "--low", "XXX"]);
        let Commands::Validate { sample, tags } = cli.command else {
            unreachable!("parsed a validate command");
        };

        let mut config = Config::default();
        tags.apply(&mut config.tags);

        assert_eq!(sample, "// XXX: later");
        assert_eq!(config.tags.normal, "TODO");
        assert_eq!(config.tags.low, "XXX");
    }

    #[test]
    fn test_flags_turn_off_config_modes() {
        let cli = Cli::parse_from(["open-tasks", "validate", "TODO x", "--case-sensitive", "--literal"]);
        let Commands::Validate { tags, .. } = cli.command else {
            unreachable!("parsed a validate command");
        };

        let mut config = Config::default();
        config.tags.ignore_case = true;
        config.tags.regex = true;
        tags.apply(&mut config.tags);

        assert!(!config.tags.ignore_case);
        assert!(!config.tags.regex);
    }

    #[test]
    fn test_absent_flags_keep_config_modes() {
        let cli = Cli::parse_from(["open-tasks", "scan"]);
        let Commands::Scan(args) = cli.command else {
            unreachable!("parsed a scan command");
        };

        let mut config = Config::default();
        config.tags.ignore_case = true;
        config.tags.regex = true;
        args.apply(&mut config);

        assert!(config.tags.ignore_case);
        assert!(config.tags.regex);
    }

    #[test]
    fn test_opposite_mode_flags_conflict() {
        assert!(Cli::try_parse_from(["open-tasks", "scan", "-i", "--case-sensitive"]).is_err());
        assert!(Cli::try_parse_from(["open-tasks", "scan", "--regex", "--literal"]).is_err());
    }

    fn sample_report() -> Report {
        Report::new(
            vec![
                TaskRecord::new("src/b.rs", 7, Priority::Normal, "TODO", "split, then merge"),
                TaskRecord::new("src/a.rs", 3, Priority::High, "FIXME", "crash"),
            ],
            vec![SkippedFile::new("bin/blob.dat", "not valid UTF-8")],
            3,
        )
    }

    #[test]
    fn test_render_csv() {
        assert_eq!(
            render_csv(&sample_report()),
            "path,line,priority,tag,message\n\
             src/a.rs,3,HIGH,FIXME,crash\n\
             src/b.rs,7,NORMAL,TODO,\"split, then merge\"\n"
        );
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample_report());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "src/a.rs:3: [HIGH] FIXME crash");
        assert_eq!(lines[1], "src/b.rs:7: [NORMAL] TODO split, then merge");
        assert!(text.contains("  bin/blob.dat - not valid UTF-8"));
        assert!(text.ends_with("2 tasks (1 high, 1 normal, 0 low) in 3 files, 1 skipped\n"));
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }
}
