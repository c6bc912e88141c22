//! Scan configuration and exclusion rules.
//!
//! A run is described by a [`ScanConfig`]: two validated directories plus the
//! scan options. It is built once, before anything on disk is touched, and
//! handed to the scanner. Defaults for the options can come from a TOML file:
//!
//! ```toml
//! [scan]
//! include_folders = true
//! extension_style = "last"
//! mode = "persistent"
//! interval_secs = 30
//!
//! [filters.exclude]
//! filenames = ["desktop.ini"]
//! patterns = ["*.part"]
//! extensions = ["crdownload"]
//! regex = []
//! ```

use crate::extension::ExtensionStyle;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {role} path {}: {reason}", .path.display())]
    InvalidPath {
        role: PathRole,
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid scan interval '{0}': expected a positive whole number of seconds")]
    InvalidInterval(String),

    #[error("Persistent mode requires a scan interval")]
    MissingInterval,

    #[error("Unrecognized scan mode '{0}': expected 'single' or 'persistent'")]
    UnknownMode(String),
}

/// Which of the two run directories a path error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    Source,
    Destination,
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRole::Source => write!(f, "source"),
            PathRole::Destination => write!(f, "destination"),
        }
    }
}

/// Scan mode as named by the user, before an interval is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeKind {
    #[default]
    Single,
    Persistent,
}

impl FromStr for ModeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "single" => Ok(ModeKind::Single),
            "p" | "persistent" => Ok(ModeKind::Persistent),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// How often the source is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// One pass, then exit.
    Single,
    /// A pass every `interval` until stopped.
    Persistent { interval: Duration },
}

impl ScanMode {
    /// Combines a mode with an optional interval, rejecting a persistent mode
    /// without one.
    pub fn new(kind: ModeKind, interval: Option<Duration>) -> Result<Self, ConfigError> {
        match kind {
            ModeKind::Single => Ok(ScanMode::Single),
            ModeKind::Persistent => interval
                .map(|interval| ScanMode::Persistent { interval })
                .ok_or(ConfigError::MissingInterval),
        }
    }
}

/// Parses a scan interval given in whole seconds.
pub fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidInterval(raw.to_string()))?;
    interval_from_secs(secs)
}

/// Converts a second count into an interval. Zero and negative values are rejected.
pub fn interval_from_secs(secs: i64) -> Result<Duration, ConfigError> {
    if secs <= 0 {
        return Err(ConfigError::InvalidInterval(secs.to_string()));
    }
    Ok(Duration::from_secs(secs as u64))
}

/// Checks that `path` is an existing directory and returns its canonical form.
pub fn validate_directory(path: &Path, role: PathRole) -> Result<PathBuf, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidPath {
        role,
        path: path.to_path_buf(),
        reason,
    };

    let meta = fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    fs::canonicalize(path).map_err(|e| invalid(e.to_string()))
}

/// A fully validated description of one run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Move extensionless entries (folders included) to the destination root.
    pub include_folders: bool,
    pub extension_style: ExtensionStyle,
    pub mode: ScanMode,
    pub filters: FilterRules,
}

impl ScanConfig {
    /// Validates both directories. Options start at their defaults: folders
    /// included, last-suffix classification, a single pass, no exclusions.
    pub fn new(source: &Path, destination: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            source: validate_directory(source, PathRole::Source)?,
            destination: validate_directory(destination, PathRole::Destination)?,
            include_folders: true,
            extension_style: ExtensionStyle::default(),
            mode: ScanMode::Single,
            filters: FilterRules::default(),
        })
    }

    pub fn with_include_folders(mut self, include_folders: bool) -> Self {
        self.include_folders = include_folders;
        self
    }

    pub fn with_extension_style(mut self, style: ExtensionStyle) -> Self {
        self.extension_style = style;
        self
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_filters(mut self, filters: FilterRules) -> Self {
        self.filters = filters;
        self
    }

    /// True when the run sorts a directory into itself.
    pub fn is_in_place(&self) -> bool {
        self.source == self.destination
    }
}

/// Contents of a configuration file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub scan: ScanDefaults,
    #[serde(default)]
    pub filters: FilterRules,
}

/// `[scan]` section of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanDefaults {
    pub include_folders: Option<bool>,
    pub extension_style: Option<ExtensionStyle>,
    pub mode: Option<String>,
    pub interval_secs: Option<i64>,
}

/// `[filters]` section: entries matching these rules are skipped like hidden ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding entries from a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact names, e.g. `desktop.ini`.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the entry name, e.g. `*.part`.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regular expressions matched against the entry name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl FileConfig {
    /// Loads configuration, searching in order:
    /// 1. `config_path` if given (must exist)
    /// 2. `./.extsortrc.toml`
    /// 3. `$HOME/.config/extsort/config.toml`
    ///
    /// Falls back to defaults when nothing is found.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".extsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("extsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compiles the rules, validating every pattern.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Exclusion rules with patterns compiled once per run.
#[derive(Debug, Default)]
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Returns true if the entry at `path` is excluded by any rule.
    pub fn excludes(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return true;
        }

        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return true;
            }
        }

        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
            || self
                .exclude_regexes
                .iter()
                .any(|regex| regex.is_match(&file_name))
    }
}
