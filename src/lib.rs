//! extsort - sort a directory's entries into per-extension subfolders
//!
//! This library classifies directory entries by extension, creates one
//! destination folder per extension, and moves entries into them without ever
//! overwriting anything. Passes can run once or repeat on a fixed interval.

pub mod cli;
pub mod config;
pub mod destination;
pub mod extension;
pub mod file_organizer;
pub mod hidden;
pub mod logging;
pub mod output;
pub mod scan;
pub mod scheduler;

pub use config::{ConfigError, FileConfig, ScanConfig, ScanMode};
pub use destination::{DestinationManager, FolderMap, FolderStatus};
pub use extension::{ExtensionKey, ExtensionStyle, FolderNaming};
pub use file_organizer::{FileOrganizer, MoveOutcome, OrganizeError, UnmovedReason};
pub use hidden::{DotPrefix, HiddenPredicate, SystemHidden};
pub use scan::{DirectoryEntry, PassReport, ScanError, Scanner};
pub use scheduler::{Scheduler, StopHandle};

pub use cli::{Args, run_cli};
