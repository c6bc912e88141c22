/// Moving scanned entries into their destination.
///
/// This module relocates one entry at a time: files with an extension go into
/// their extension folder, folders and extensionless files go to the
/// destination root. Nothing is ever overwritten or renamed; an occupied target
/// leaves the entry where it is.
use crate::destination::FolderMap;
use crate::scan::DirectoryEntry;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while preparing destinations or moving entries.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create an extension folder.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// An extension folder's path is taken by something that is not a directory.
    #[error("{} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// No destination folder was prepared for this extension.
    #[error("No destination folder prepared for extension '{0}'")]
    MissingFolder(String),

    /// The rename itself failed.
    #[error("Failed to move {} to {}: {error} ({kind})", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        kind: MoveFailureKind,
        #[source]
        error: io::Error,
    },
}

/// Result type for organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Broad classification of a failed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveFailureKind {
    PermissionDenied,
    CrossDevice,
    StorageFull,
    Other,
}

impl From<&io::Error> for MoveFailureKind {
    fn from(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => MoveFailureKind::PermissionDenied,
            io::ErrorKind::CrossesDevices => MoveFailureKind::CrossDevice,
            io::ErrorKind::StorageFull => MoveFailureKind::StorageFull,
            _ => MoveFailureKind::Other,
        }
    }
}

impl fmt::Display for MoveFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveFailureKind::PermissionDenied => write!(f, "permission denied"),
            MoveFailureKind::CrossDevice => write!(f, "cross-device move"),
            MoveFailureKind::StorageFull => write!(f, "storage full"),
            MoveFailureKind::Other => write!(f, "I/O error"),
        }
    }
}

/// Why an entry stayed in the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnmovedReason {
    /// Something with the same name already occupies the target.
    Collision { existing: PathBuf },
    /// Extensionless entry while folders are excluded from the run.
    FoldersExcluded,
    /// The entry is, or contains, the destination root.
    ContainsDestination,
    /// The target path is the entry itself, as with folders in an in-place sort.
    AlreadyInPlace,
}

impl fmt::Display for UnmovedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmovedReason::Collision { existing } => {
                write!(f, "{} already exists", existing.display())
            }
            UnmovedReason::FoldersExcluded => write!(f, "folders are excluded"),
            UnmovedReason::ContainsDestination => write!(f, "contains the destination"),
            UnmovedReason::AlreadyInPlace => write!(f, "already in place"),
        }
    }
}

/// What happened to a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { to: PathBuf },
    Unmoved(UnmovedReason),
}

/// The entry's name together with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub name: String,
    pub outcome: MoveOutcome,
}

impl MoveResult {
    pub fn moved(&self) -> bool {
        matches!(self.outcome, MoveOutcome::Moved { .. })
    }
}

/// Moves entries into their destination.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves one entry into its destination under `root`.
    ///
    /// Entries with an extension key go into the folder `folders` holds for
    /// that key. Entries without one go to `root` itself, or stay put when
    /// `include_folders` is false.
    ///
    /// # Returns
    ///
    /// `Ok` with the outcome for moves and expected skips (collisions, excluded
    /// folders). An `OrganizeError` only for failures the caller has to see:
    /// a missing folder mapping or a rename the filesystem refused.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extsort::destination::DestinationManager;
    /// use extsort::extension::ExtensionStyle;
    /// use extsort::file_organizer::FileOrganizer;
    /// use extsort::scan::DirectoryEntry;
    /// use std::path::Path;
    ///
    /// let entry = DirectoryEntry::new(Path::new("/in/a.txt"), false, ExtensionStyle::Last);
    /// let mut manager = DestinationManager::new(Path::new("/out"));
    /// let folders = manager.ensure_folders([&entry.key]).unwrap();
    ///
    /// let result = FileOrganizer::move_entry(&entry, Path::new("/out"), &folders, true).unwrap();
    /// println!("{} moved: {}", result.name, result.moved());
    /// ```
    pub fn move_entry(
        entry: &DirectoryEntry,
        root: &Path,
        folders: &FolderMap,
        include_folders: bool,
    ) -> OrganizeResult<MoveResult> {
        let target_dir = if entry.key.is_empty() {
            if !include_folders {
                return Ok(Self::unmoved(entry, UnmovedReason::FoldersExcluded));
            }
            root.to_path_buf()
        } else {
            folders
                .get(&entry.key)
                .map(|folder| folder.path.clone())
                .ok_or_else(|| OrganizeError::MissingFolder(entry.key.as_str().to_string()))?
        };

        if target_dir.starts_with(&entry.path) {
            return Ok(Self::unmoved(entry, UnmovedReason::ContainsDestination));
        }

        let target = target_dir.join(&entry.file_name);
        if target == entry.path {
            debug!(entry = %entry.name, "already in place");
            return Ok(Self::unmoved(entry, UnmovedReason::AlreadyInPlace));
        }
        if fs::symlink_metadata(&target).is_ok() {
            debug!(entry = %entry.name, target = %target.display(), "target occupied, skipping");
            return Ok(Self::unmoved(entry, UnmovedReason::Collision { existing: target }));
        }

        fs::rename(&entry.path, &target).map_err(|error| {
            warn!(entry = %entry.name, %error, "move failed");
            OrganizeError::FileMoveFailure {
                from: entry.path.clone(),
                to: target.clone(),
                kind: MoveFailureKind::from(&error),
                error,
            }
        })?;

        debug!(entry = %entry.name, to = %target.display(), "moved");
        Ok(MoveResult {
            name: entry.name.clone(),
            outcome: MoveOutcome::Moved { to: target },
        })
    }

    fn unmoved(entry: &DirectoryEntry, reason: UnmovedReason) -> MoveResult {
        MoveResult {
            name: entry.name.clone(),
            outcome: MoveOutcome::Unmoved(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::DestinationManager;
    use crate::extension::ExtensionStyle;
    use tempfile::TempDir;

    struct Dirs {
        _temp: TempDir,
        src: PathBuf,
        dst: PathBuf,
    }

    fn dirs() -> Dirs {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir(&src).expect("Failed to create src");
        fs::create_dir(&dst).expect("Failed to create dst");
        Dirs {
            _temp: temp,
            src,
            dst,
        }
    }

    fn entry(path: &Path) -> DirectoryEntry {
        DirectoryEntry::new(path, path.is_dir(), ExtensionStyle::Last)
    }

    #[test]
    fn test_move_file_into_extension_folder() {
        let d = dirs();
        let file = d.src.join("a.txt");
        fs::write(&file, "a").expect("Failed to write file");
        let entry = entry(&file);

        let folders = DestinationManager::new(&d.dst)
            .ensure_folders([&entry.key])
            .expect("Failed to create folders");
        let result = FileOrganizer::move_entry(&entry, &d.dst, &folders, true)
            .expect("Failed to move file");

        assert!(result.moved());
        assert_eq!(result.name, "a.txt");
        assert!(!file.exists());
        assert!(d.dst.join("txt Files").join("a.txt").exists());
    }

    #[test]
    fn test_move_folder_to_destination_root() {
        let d = dirs();
        let folder = d.src.join("c");
        fs::create_dir(&folder).expect("Failed to create folder");
        fs::write(folder.join("inner.txt"), "x").expect("Failed to write file");

        let result =
            FileOrganizer::move_entry(&entry(&folder), &d.dst, &FolderMap::default(), true)
                .expect("Failed to move folder");

        assert!(result.moved());
        assert!(d.dst.join("c").join("inner.txt").exists());
        assert!(!folder.exists());
    }

    #[test]
    fn test_collision_at_root_is_not_an_error() {
        let d = dirs();
        let folder = d.src.join("c");
        fs::create_dir(&folder).expect("Failed to create folder");
        fs::write(d.dst.join("c"), "occupied").expect("Failed to write file");

        let result =
            FileOrganizer::move_entry(&entry(&folder), &d.dst, &FolderMap::default(), true)
                .expect("Collision should not be an error");

        assert!(!result.moved());
        assert!(matches!(
            result.outcome,
            MoveOutcome::Unmoved(UnmovedReason::Collision { .. })
        ));
        assert!(folder.is_dir());
        assert_eq!(
            fs::read_to_string(d.dst.join("c")).expect("Failed to read file"),
            "occupied"
        );
    }

    #[test]
    fn test_collision_in_extension_folder_does_not_overwrite() {
        let d = dirs();
        let file = d.src.join("a.txt");
        fs::write(&file, "new").expect("Failed to write file");
        let entry = entry(&file);

        let folders = DestinationManager::new(&d.dst)
            .ensure_folders([&entry.key])
            .expect("Failed to create folders");
        fs::write(d.dst.join("txt Files").join("a.txt"), "old").expect("Failed to write file");

        let result = FileOrganizer::move_entry(&entry, &d.dst, &folders, true)
            .expect("Collision should not be an error");

        assert!(!result.moved());
        assert!(file.exists());
        assert_eq!(
            fs::read_to_string(d.dst.join("txt Files").join("a.txt")).expect("Failed to read"),
            "old"
        );
    }

    #[test]
    fn test_folders_excluded() {
        let d = dirs();
        let file = d.src.join("README");
        fs::write(&file, "x").expect("Failed to write file");

        let result = FileOrganizer::move_entry(&entry(&file), &d.dst, &FolderMap::default(), false)
            .expect("Exclusion should not be an error");

        assert_eq!(
            result.outcome,
            MoveOutcome::Unmoved(UnmovedReason::FoldersExcluded)
        );
        assert!(file.exists());
    }

    #[test]
    fn test_destination_nested_in_source_is_not_moved() {
        let d = dirs();
        let nested = d.src.join("sorted");
        fs::create_dir(&nested).expect("Failed to create nested destination");

        let result = FileOrganizer::move_entry(&entry(&nested), &nested, &FolderMap::default(), true)
            .expect("Should not be an error");

        assert_eq!(
            result.outcome,
            MoveOutcome::Unmoved(UnmovedReason::ContainsDestination)
        );
        assert!(nested.is_dir());
    }

    #[test]
    fn test_folder_at_its_own_target_is_in_place() {
        let d = dirs();
        let folder = d.src.join("projects");
        fs::create_dir(&folder).expect("Failed to create folder");

        let result =
            FileOrganizer::move_entry(&entry(&folder), &d.src, &FolderMap::default(), true)
                .expect("Should not be an error");

        assert_eq!(
            result.outcome,
            MoveOutcome::Unmoved(UnmovedReason::AlreadyInPlace)
        );
        assert!(folder.is_dir());
    }

    // Filesystems such as APFS refuse names that are not valid UTF-8.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_preserved() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let d = dirs();
        let raw = OsStr::from_bytes(b"caf\xe9.txt");
        let file = d.src.join(raw);
        fs::write(&file, "x").expect("Failed to write file");
        let entry = entry(&file);

        let folders = DestinationManager::new(&d.dst)
            .ensure_folders([&entry.key])
            .expect("Failed to create folders");
        let result = FileOrganizer::move_entry(&entry, &d.dst, &folders, true)
            .expect("Failed to move file");

        assert!(result.moved());
        assert!(d.dst.join("txt Files").join(raw).exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_missing_folder_mapping_is_an_error() {
        let d = dirs();
        let file = d.src.join("a.pdf");
        fs::write(&file, "x").expect("Failed to write file");

        let result = FileOrganizer::move_entry(&entry(&file), &d.dst, &FolderMap::default(), true);
        assert!(matches!(result, Err(OrganizeError::MissingFolder(ext)) if ext == "pdf"));
        assert!(file.exists());
    }

    #[test]
    fn test_vanished_entry_surfaces_io_error() {
        let d = dirs();
        let file = d.src.join("gone.txt");
        fs::write(&file, "x").expect("Failed to write file");
        let entry = entry(&file);
        let folders = DestinationManager::new(&d.dst)
            .ensure_folders([&entry.key])
            .expect("Failed to create folders");
        fs::remove_file(&file).expect("Failed to remove file");

        let result = FileOrganizer::move_entry(&entry, &d.dst, &folders, true);
        assert!(matches!(
            result,
            Err(OrganizeError::FileMoveFailure {
                kind: MoveFailureKind::Other,
                ..
            })
        ));
    }

    #[test]
    fn test_failure_kind_classification() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let full = io::Error::from(io::ErrorKind::StorageFull);
        let other = io::Error::from(io::ErrorKind::NotFound);

        assert_eq!(MoveFailureKind::from(&denied), MoveFailureKind::PermissionDenied);
        assert_eq!(MoveFailureKind::from(&full), MoveFailureKind::StorageFull);
        assert_eq!(MoveFailureKind::from(&other), MoveFailureKind::Other);
    }
}
