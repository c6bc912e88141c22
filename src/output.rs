//! Output formatting and styling module.
//!
//! Everything the user reads goes through here: colored status lines, the
//! per-pass progress bar, the moved/unmoved summary and the JSON report.

use crate::destination::FolderMap;
use crate::file_organizer::MoveResult;
use crate::scan::{PassObserver, PassReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// OutputFormatter::error("Failed to move file");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for the moves of one pass.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the folders a pass created or reused.
    pub fn folders(folders: &FolderMap) {
        let created: Vec<&str> = folders.created().map(|f| f.name.as_str()).collect();
        let existing: Vec<&str> = folders.existing().map(|f| f.name.as_str()).collect();

        if !created.is_empty() {
            Self::success(&format!("Created subfolders {:?}", created));
        }
        if !existing.is_empty() {
            Self::plain(&format!("  Existing subfolders {:?}", existing));
        }
    }

    /// Prints the summary of one pass: each move batch, then the moved and
    /// unmoved counts with their names.
    pub fn pass_summary(report: &PassReport) {
        if let Some(error) = &report.listing_error {
            Self::warning(&format!(
                "Could not read {}: {}",
                report.source.display(),
                error
            ));
            return;
        }

        if report.is_empty() {
            Self::info("No entries found in directory.");
            return;
        }

        for (folder, names) in report.moved_by_folder() {
            match folder {
                Some(folder) => Self::plain(&format!("  {} ← {:?}", folder, names)),
                None => Self::plain(&format!("  Folders moved: {:?}", names)),
            }
        }

        Self::header("SUMMARY");
        println!(
            "{} {} moved to {}",
            report.moved_count().to_string().green().bold(),
            entry_word(report.moved_count()),
            report.destination.display()
        );
        if !report.moved.is_empty() {
            println!("  {:?}", report.moved_names());
        }

        println!(
            "{} {} left in {}",
            report.unmoved_count().to_string().yellow().bold(),
            entry_word(report.unmoved_count()),
            report.source.display()
        );
        for entry in &report.unmoved {
            println!("  - {} ({})", entry.name, entry.reason);
        }

        for failed in &report.failed {
            Self::error(&format!("{}: {}", failed.name, failed.error));
        }
        if report.aborted {
            Self::warning("Pass aborted; remaining entries were not attempted.");
        }
    }

    /// Prints the report as JSON: pretty for a single pass, one line per pass
    /// for persistent runs.
    pub fn json(report: &PassReport, pretty: bool) {
        let rendered = if pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        match rendered {
            Ok(json) => println!("{}", json),
            Err(e) => Self::error(&format!("Could not serialize report: {}", e)),
        }
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }
}

fn entry_word(count: usize) -> &'static str {
    if count == 1 { "entry" } else { "entries" }
}

/// Shows folder creation and a progress bar while a pass runs.
pub struct ProgressObserver {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    /// A disabled observer prints nothing, used for JSON output.
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }
}

impl PassObserver for ProgressObserver {
    fn pass_started(&mut self, entries: usize) {
        if self.enabled && entries > 0 {
            self.bar = Some(OutputFormatter::create_progress_bar(entries as u64));
        }
    }

    fn folders_ready(&mut self, folders: &FolderMap) {
        if !self.enabled {
            return;
        }
        match &self.bar {
            Some(bar) => bar.suspend(|| OutputFormatter::folders(folders)),
            None => OutputFormatter::folders(folders),
        }
    }

    fn entry_processed(&mut self, result: &MoveResult) {
        if let Some(bar) = &self.bar {
            bar.set_message(result.name.clone());
            bar.inc(1);
        }
    }

    fn pass_finished(&mut self, _report: &PassReport) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
