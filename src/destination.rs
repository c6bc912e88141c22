//! Destination folder management.
//!
//! One folder per distinct extension key is created under the destination
//! root. Folders that already exist are reused; nothing here ever removes one.

use crate::extension::{ExtensionKey, FolderNaming};
use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether an ensured folder had to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    Created,
    Existing,
}

/// A destination folder for one extension key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFolder {
    pub key: ExtensionKey,
    pub name: String,
    pub path: PathBuf,
    pub status: FolderStatus,
}

/// The folders ensured for one pass, keyed by extension.
#[derive(Debug, Clone, Default)]
pub struct FolderMap {
    folders: BTreeMap<ExtensionKey, DestinationFolder>,
}

impl FolderMap {
    pub fn get(&self, key: &ExtensionKey) -> Option<&DestinationFolder> {
        self.folders.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DestinationFolder> {
        self.folders.values()
    }

    /// Folders created by this call, in key order.
    pub fn created(&self) -> impl Iterator<Item = &DestinationFolder> {
        self.iter().filter(|f| f.status == FolderStatus::Created)
    }

    /// Folders that were already present, in key order.
    pub fn existing(&self) -> impl Iterator<Item = &DestinationFolder> {
        self.iter().filter(|f| f.status == FolderStatus::Existing)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

/// Creates and tracks extension folders under a destination root.
#[derive(Debug)]
pub struct DestinationManager {
    root: PathBuf,
    naming: FolderNaming,
}

impl DestinationManager {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            naming: FolderNaming::new(),
        }
    }

    pub fn naming(&self) -> &FolderNaming {
        &self.naming
    }

    /// Ensures a folder exists for every non-empty key in `keys`.
    ///
    /// Empty keys are skipped; those entries belong in the root itself.
    /// Calling this again with the same keys reports every folder as
    /// [`FolderStatus::Existing`] and changes nothing on disk.
    ///
    /// # Errors
    ///
    /// Any creation failure other than "already exists", and a non-directory
    /// occupying a folder's name.
    pub fn ensure_folders<'a, I>(&mut self, keys: I) -> OrganizeResult<FolderMap>
    where
        I: IntoIterator<Item = &'a ExtensionKey>,
    {
        let mut map = FolderMap::default();

        for key in keys {
            if map.folders.contains_key(key) {
                continue;
            }
            let Some(name) = self.naming.folder_name(key) else {
                continue;
            };

            let path = self.root.join(&name);
            let status = Self::ensure_dir(&path)?;
            debug!(folder = %name, ?status, "destination folder ready");

            map.folders.insert(
                key.clone(),
                DestinationFolder {
                    key: key.clone(),
                    name,
                    path,
                    status,
                },
            );
        }

        Ok(map)
    }

    fn ensure_dir(path: &Path) -> OrganizeResult<FolderStatus> {
        match fs::create_dir(path) {
            Ok(()) => Ok(FolderStatus::Created),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if path.is_dir() {
                    Ok(FolderStatus::Existing)
                } else {
                    Err(OrganizeError::NotADirectory(path.to_path_buf()))
                }
            }
            Err(e) => Err(OrganizeError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}
