//! Single scan passes over a source directory.
//!
//! A pass lists the source once, drops hidden and excluded entries, ensures a
//! destination folder per extension, then moves every remaining entry. The
//! outcome is collected into a [`PassReport`]. Nothing carries over between
//! passes except what is on disk.
//!
//! Repetition on a timer lives in [`crate::scheduler`].

use crate::config::{CompiledFilters, ConfigError, ScanConfig};
use crate::destination::{DestinationManager, FolderMap};
use crate::extension::{ExtensionKey, ExtensionStyle};
use crate::file_organizer::{
    FileOrganizer, MoveFailureKind, MoveOutcome, MoveResult, OrganizeError, UnmovedReason,
};
use crate::hidden::{HiddenPredicate, SystemHidden};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that end a pass without a report.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The source root is gone. Fatal for the run.
    #[error("Source directory {} no longer exists", .0.display())]
    SourceMissing(PathBuf),

    /// A destination folder could not be prepared.
    #[error(transparent)]
    Destination(#[from] OrganizeError),
}

impl ScanError {
    /// Whether a persistent run should stop on this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::SourceMissing(_))
    }
}

/// Snapshot of one entry in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    /// The name exactly as stored on disk. Targets are built from this.
    pub file_name: OsString,
    /// Lossy UTF-8 form of `file_name`, for classification and reports.
    pub name: String,
    /// Empty for directories and extensionless files.
    pub key: ExtensionKey,
    pub is_dir: bool,
    pub hidden: bool,
}

impl DirectoryEntry {
    /// Builds an entry, classifying its name with `style`. Directories always
    /// get the empty key.
    pub fn new(path: &Path, is_dir: bool, style: ExtensionStyle) -> Self {
        let file_name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        let name = file_name.to_string_lossy().to_string();
        let key = if is_dir {
            ExtensionKey::none()
        } else {
            style.classify(&name)
        };

        Self {
            path: path.to_path_buf(),
            file_name,
            name,
            key,
            is_dir,
            hidden: false,
        }
    }
}

/// Extension key → number of entries carrying it.
pub type ExtensionGroups = BTreeMap<ExtensionKey, usize>;

/// Counts entries per extension key.
pub fn group_extensions<'a, I>(entries: I) -> ExtensionGroups
where
    I: IntoIterator<Item = &'a DirectoryEntry>,
{
    let mut groups = ExtensionGroups::new();
    for entry in entries {
        *groups.entry(entry.key.clone()).or_insert(0) += 1;
    }
    groups
}

/// A moved entry.
#[derive(Debug, Clone, Serialize)]
pub struct MovedEntry {
    pub name: String,
    /// Extension folder it went into; `None` for the destination root.
    pub folder: Option<String>,
    pub to: PathBuf,
}

/// An entry left in place.
#[derive(Debug, Clone, Serialize)]
pub struct UnmovedEntry {
    pub name: String,
    #[serde(flatten)]
    pub reason: UnmovedReason,
}

/// An entry whose move failed with an I/O error.
#[derive(Debug, Clone, Serialize)]
pub struct FailedEntry {
    pub name: String,
    pub kind: MoveFailureKind,
    pub error: String,
}

/// Outcome of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub created_folders: Vec<String>,
    pub existing_folders: Vec<String>,
    pub moved: Vec<MovedEntry>,
    pub unmoved: Vec<UnmovedEntry>,
    pub failed: Vec<FailedEntry>,
    /// Set when the source could not be listed; the pass then moves nothing.
    pub listing_error: Option<String>,
    /// Set when an I/O failure stopped the pass before every entry was tried.
    pub aborted: bool,
    pub elapsed_ms: u64,
}

impl PassReport {
    fn new(config: &ScanConfig) -> Self {
        Self {
            started_at: Utc::now(),
            source: config.source.clone(),
            destination: config.destination.clone(),
            created_folders: Vec::new(),
            existing_folders: Vec::new(),
            moved: Vec::new(),
            unmoved: Vec::new(),
            failed: Vec::new(),
            listing_error: None,
            aborted: false,
            elapsed_ms: 0,
        }
    }

    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    pub fn unmoved_count(&self) -> usize {
        self.unmoved.len()
    }

    pub fn moved_names(&self) -> Vec<&str> {
        self.moved.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn unmoved_names(&self) -> Vec<&str> {
        self.unmoved.iter().map(|u| u.name.as_str()).collect()
    }

    /// True when the pass saw nothing to do.
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.unmoved.is_empty() && self.failed.is_empty()
    }

    /// Moved names grouped by destination folder; the root is keyed `None`.
    pub fn moved_by_folder(&self) -> BTreeMap<Option<&str>, Vec<&str>> {
        let mut batches: BTreeMap<Option<&str>, Vec<&str>> = BTreeMap::new();
        for entry in &self.moved {
            batches
                .entry(entry.folder.as_deref())
                .or_default()
                .push(entry.name.as_str());
        }
        batches
    }

    fn record(&mut self, result: MoveResult, folder: Option<String>) {
        match result.outcome {
            MoveOutcome::Moved { to } => self.moved.push(MovedEntry {
                name: result.name,
                folder,
                to,
            }),
            MoveOutcome::Unmoved(reason) => self.unmoved.push(UnmovedEntry {
                name: result.name,
                reason,
            }),
        }
    }
}

/// Hooks for reporting progress while a pass runs.
pub trait PassObserver {
    fn pass_started(&mut self, _entries: usize) {}
    fn folders_ready(&mut self, _folders: &FolderMap) {}
    fn entry_processed(&mut self, _result: &MoveResult) {}
    fn pass_finished(&mut self, _report: &PassReport) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PassObserver for NoopObserver {}

/// Anything that can run one pass. The scheduler repeats these.
pub trait RunPass {
    fn run_pass(&mut self) -> Result<PassReport, ScanError>;
}

/// Runs passes for one source/destination pair.
pub struct Scanner {
    config: ScanConfig,
    filters: CompiledFilters,
    hidden: Box<dyn HiddenPredicate>,
    destinations: DestinationManager,
    observer: Box<dyn PassObserver>,
}

impl Scanner {
    /// Creates a scanner, compiling the exclusion rules.
    ///
    /// Fails on invalid patterns, before anything on disk is touched.
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        let filters = config.filters.compile()?;
        let destinations = DestinationManager::new(&config.destination);
        Ok(Self {
            config,
            filters,
            hidden: Box::new(SystemHidden),
            destinations,
            observer: Box::new(NoopObserver),
        })
    }

    /// Replaces the hidden-entry check.
    pub fn with_hidden_predicate(mut self, predicate: impl HiddenPredicate + 'static) -> Self {
        self.hidden = Box::new(predicate);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn PassObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Lists the source directory, sorted by name.
    ///
    /// Excluded entries are dropped here; hidden ones are kept with their
    /// `hidden` flag set. Entries whose type cannot be read are skipped.
    pub fn list_entries(&self) -> io::Result<Vec<DirectoryEntry>> {
        let mut entries = Vec::new();

        for dir_entry in fs::read_dir(&self.config.source)?.flatten() {
            let path = dir_entry.path();
            let Ok(file_type) = dir_entry.file_type() else {
                debug!(path = %path.display(), "skipping entry with unreadable type");
                continue;
            };
            if self.filters.excludes(&path) {
                debug!(path = %path.display(), "excluded by filter rules");
                continue;
            }

            let mut entry =
                DirectoryEntry::new(&path, file_type.is_dir(), self.config.extension_style);
            entry.hidden = self.hidden.is_hidden(&path);
            entries.push(entry);
        }

        entries.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(entries)
    }

    /// Runs one pass.
    ///
    /// # Errors
    ///
    /// [`ScanError::SourceMissing`] if the source root no longer exists, and
    /// [`ScanError::Destination`] if an extension folder cannot be created.
    /// A source that exists but cannot be read yields an empty report with
    /// `listing_error` set. A failed move is recorded in `failed` and ends the
    /// pass early with `aborted` set.
    pub fn run_pass(&mut self) -> Result<PassReport, ScanError> {
        let timer = Instant::now();
        let mut report = PassReport::new(&self.config);

        if !self.config.source.exists() {
            return Err(ScanError::SourceMissing(self.config.source.clone()));
        }

        let entries = match self.list_entries() {
            Ok(entries) => entries,
            Err(error) => {
                warn!(source = %self.config.source.display(), %error, "cannot list source");
                report.listing_error = Some(error.to_string());
                report.elapsed_ms = timer.elapsed().as_millis() as u64;
                self.observer.pass_finished(&report);
                return Ok(report);
            }
        };

        let visible: Vec<DirectoryEntry> = entries.into_iter().filter(|e| !e.hidden).collect();
        self.observer.pass_started(visible.len());

        let groups = group_extensions(&visible);
        debug!(entries = visible.len(), groups = groups.len(), "source listed");

        let folders = self.destinations.ensure_folders(groups.keys())?;
        report.created_folders = folders.created().map(|f| f.name.clone()).collect();
        report.existing_folders = folders.existing().map(|f| f.name.clone()).collect();
        self.observer.folders_ready(&folders);

        for entry in &visible {
            match FileOrganizer::move_entry(
                entry,
                &self.config.destination,
                &folders,
                self.config.include_folders,
            ) {
                Ok(result) => {
                    self.observer.entry_processed(&result);
                    let folder = folders.get(&entry.key).map(|f| f.name.clone());
                    report.record(result, folder);
                }
                Err(error) => {
                    let kind = match &error {
                        OrganizeError::FileMoveFailure { kind, .. } => *kind,
                        _ => MoveFailureKind::Other,
                    };
                    report.failed.push(FailedEntry {
                        name: entry.name.clone(),
                        kind,
                        error: error.to_string(),
                    });
                    report.aborted = true;
                    break;
                }
            }
        }

        report.elapsed_ms = timer.elapsed().as_millis() as u64;
        info!(
            moved = report.moved_count(),
            unmoved = report.unmoved_count(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed_ms,
            "pass complete"
        );
        self.observer.pass_finished(&report);
        Ok(report)
    }
}

impl RunPass for Scanner {
    fn run_pass(&mut self) -> Result<PassReport, ScanError> {
        Scanner::run_pass(self)
    }
}
