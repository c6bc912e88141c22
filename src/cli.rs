//! Command-line interface module for extsort.
//!
//! This module handles:
//! - Argument parsing
//! - Merging arguments with the configuration file
//! - Running a single pass or a persistent scan and reporting on it

use crate::config::{
    ConfigError, FileConfig, ModeKind, ScanConfig, ScanMode, interval_from_secs, parse_interval,
};
use crate::extension::ExtensionStyle;
use crate::output::{OutputFormatter, ProgressObserver};
use crate::scan::{PassReport, ScanError, Scanner};
use crate::scheduler::Scheduler;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Sort the entries of a directory into per-extension subfolders.
#[derive(Debug, Parser)]
#[command(name = "extsort", version, about, long_about = None)]
pub struct Args {
    /// Directory whose entries are sorted
    pub source: PathBuf,

    /// Where sorted entries go [default: SOURCE, sorting it in place]
    pub destination: Option<PathBuf>,

    /// Scan mode: single (s) or persistent (p)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Seconds between passes in persistent mode
    #[arg(short, long, value_name = "SECS", allow_hyphen_values = true)]
    pub interval: Option<String>,

    /// Move folders and extensionless files to the destination root
    #[arg(long, conflicts_with = "no_folders")]
    pub folders: bool,

    /// Leave folders and extensionless files in the source
    #[arg(long)]
    pub no_folders: bool,

    /// Classify by the full compound suffix (tar.gz) instead of the last one (gz)
    #[arg(long)]
    pub compound: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print each pass report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print debug logging to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Errors surfaced by [`run_cli`].
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Pass aborted after {0} failed move(s)")]
    Aborted(usize),
}

impl Args {
    /// Merges the arguments over `file` and validates the result.
    ///
    /// Paths are checked first, then mode and interval. An interval is
    /// validated even in single mode, where it is otherwise unused.
    pub fn resolve(&self, file: &FileConfig) -> Result<ScanConfig, ConfigError> {
        let destination = self.destination.as_ref().unwrap_or(&self.source);
        let config = ScanConfig::new(&self.source, destination)?;

        let kind = match self.mode.as_deref().or(file.scan.mode.as_deref()) {
            Some(raw) => raw.parse::<ModeKind>()?,
            None => ModeKind::default(),
        };
        let interval = match (&self.interval, file.scan.interval_secs) {
            (Some(raw), _) => Some(parse_interval(raw)?),
            (None, Some(secs)) => Some(interval_from_secs(secs)?),
            (None, None) => None,
        };
        let mode = ScanMode::new(kind, interval)?;

        let include_folders = if self.no_folders {
            false
        } else if self.folders {
            true
        } else {
            file.scan.include_folders.unwrap_or(true)
        };

        let style = if self.compound {
            ExtensionStyle::Compound
        } else {
            file.scan.extension_style.unwrap_or_default()
        };

        Ok(config
            .with_mode(mode)
            .with_include_folders(include_folders)
            .with_extension_style(style)
            .with_filters(file.filters.clone()))
    }
}

/// Runs the CLI application with parsed arguments.
///
/// Single mode returns after one pass; persistent mode returns only on a
/// fatal error.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use extsort::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["extsort", "/home/me/Downloads"]);
/// if let Err(e) = run_cli(&args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<(), CliError> {
    let file = FileConfig::load(args.config.as_deref())?;
    let config = args.resolve(&file)?;
    let mode = config.mode;

    if !args.json {
        announce(&config);
    }

    let mut scanner = Scanner::new(config)?.with_observer(Box::new(ProgressObserver::new(!args.json)));

    match mode {
        ScanMode::Single => {
            let report = scanner.run_pass()?;
            print_report(&report, args.json, true);
            if report.aborted {
                return Err(CliError::Aborted(report.failed.len()));
            }
            Ok(())
        }
        ScanMode::Persistent { interval } => {
            let scheduler = Scheduler::new(interval);
            scheduler.run(&mut scanner, |pass, result| {
                if !args.json {
                    OutputFormatter::header(&format!("Scan #{}", pass));
                }
                match result {
                    Ok(report) => print_report(report, args.json, false),
                    Err(e) => OutputFormatter::error(&e.to_string()),
                }
            })?;
            Ok(())
        }
    }
}

fn announce(config: &ScanConfig) {
    let target = if config.is_in_place() {
        format!("Sorting {}", config.source.display())
    } else {
        format!(
            "Transferring entries from {} to {}",
            config.source.display(),
            config.destination.display()
        )
    };

    match config.mode {
        ScanMode::Single => OutputFormatter::info(&format!("{}...", target)),
        ScanMode::Persistent { interval } => OutputFormatter::info(&format!(
            "{} every {} seconds...",
            target,
            interval.as_secs()
        )),
    }
}

fn print_report(report: &PassReport, json: bool, pretty: bool) {
    if json {
        OutputFormatter::json(report, pretty);
    } else {
        OutputFormatter::pass_summary(report);
    }
}
