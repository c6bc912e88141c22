/// Extension classification and destination folder naming.
///
/// This module turns a filename into an [`ExtensionKey`] and maps keys to the
/// folder names they are sorted into (and back again).
///
/// # Examples
///
/// ```
/// use extsort::extension::{ExtensionStyle, FolderNaming};
///
/// let key = ExtensionStyle::Last.classify("archive.tar.gz");
/// assert_eq!(key.as_str(), "gz");
///
/// let mut naming = FolderNaming::default();
/// assert_eq!(naming.folder_name(&key).as_deref(), Some("gz Files"));
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Suffix appended to an extension key to form its folder name.
pub const FOLDER_SUFFIX: &str = " Files";

/// Which part of a multi-dot filename counts as its extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionStyle {
    /// Only the final suffix: `report.tar.gz` → `gz`.
    #[default]
    Last,
    /// Every suffix after the first dot: `report.tar.gz` → `tar.gz`.
    Compound,
}

impl ExtensionStyle {
    /// Classifies a filename into its extension key.
    ///
    /// Leading dots are part of the name, not a separator, so `.bashrc` has no
    /// extension. A trailing dot (`notes.`) also yields the empty key. Keys are
    /// lowercased so `A.TXT` and `b.txt` share a folder.
    pub fn classify(self, file_name: &str) -> ExtensionKey {
        let name = file_name.trim_start_matches('.');
        if name.ends_with('.') {
            return ExtensionKey::none();
        }

        let suffix = match self {
            ExtensionStyle::Last => name.rfind('.').map(|idx| &name[idx + 1..]),
            ExtensionStyle::Compound => name.find('.').map(|idx| &name[idx + 1..]),
        };

        match suffix.map(|ext| ext.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => ExtensionKey(ext.to_lowercase()),
            _ => ExtensionKey::none(),
        }
    }
}

/// A normalized extension without its leading dot. The empty key stands for
/// folders and extensionless files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ExtensionKey(String);

impl ExtensionKey {
    /// The empty key.
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, ".{}", self.0)
        }
    }
}

/// Bidirectional mapping between extension keys and folder names.
///
/// Names are derived as `"<key> Files"`. Every name handed out is remembered,
/// so [`FolderNaming::key_for`] resolves names through the table rather than by
/// parsing them.
#[derive(Debug, Clone, Default)]
pub struct FolderNaming {
    by_key: HashMap<ExtensionKey, String>,
    by_name: HashMap<String, ExtensionKey>,
}

impl FolderNaming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the folder name for `key`, registering it on first use.
    ///
    /// The empty key has no folder; those entries go to the destination root.
    pub fn folder_name(&mut self, key: &ExtensionKey) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        if let Some(name) = self.by_key.get(key) {
            return Some(name.clone());
        }

        let name = format!("{}{}", key.as_str(), FOLDER_SUFFIX);
        self.by_key.insert(key.clone(), name.clone());
        self.by_name.insert(name.clone(), key.clone());
        Some(name)
    }

    /// Looks up the key a registered folder name belongs to.
    pub fn key_for(&self, folder_name: &str) -> Option<&ExtensionKey> {
        self.by_name.get(folder_name)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_dot_yields_empty_key() {
        assert!(ExtensionStyle::Last.classify("Makefile").is_empty());
        assert!(ExtensionStyle::Compound.classify("c").is_empty());
    }

    #[test]
    fn test_last_suffix() {
        assert_eq!(ExtensionStyle::Last.classify("a.txt").as_str(), "txt");
        assert_eq!(ExtensionStyle::Last.classify("backup.tar.gz").as_str(), "gz");
    }

    #[test]
    fn test_compound_suffix() {
        assert_eq!(
            ExtensionStyle::Compound.classify("backup.tar.gz").as_str(),
            "tar.gz"
        );
        assert_eq!(ExtensionStyle::Compound.classify("a.txt").as_str(), "txt");
    }

    #[test]
    fn test_leading_and_trailing_dots() {
        assert!(ExtensionStyle::Last.classify(".bashrc").is_empty());
        assert!(ExtensionStyle::Last.classify("notes.").is_empty());
        assert_eq!(ExtensionStyle::Last.classify(".config.toml").as_str(), "toml");
        assert_eq!(
            ExtensionStyle::Compound.classify("..hidden.tar.gz").as_str(),
            "tar.gz"
        );
    }

    #[test]
    fn test_keys_are_lowercased() {
        assert_eq!(ExtensionStyle::Last.classify("PHOTO.JPG").as_str(), "jpg");
    }

    #[test]
    fn test_classification_is_deterministic() {
        for name in ["a.txt", "b", ".x", "y.tar.gz", "Z.Md", "weird..name"] {
            for style in [ExtensionStyle::Last, ExtensionStyle::Compound] {
                assert_eq!(style.classify(name), style.classify(name));
            }
        }
    }

    #[test]
    fn test_folder_naming_round_trip() {
        let mut naming = FolderNaming::new();
        let key = ExtensionStyle::Last.classify("a.txt");

        let name = naming.folder_name(&key).unwrap();
        assert_eq!(name, "txt Files");
        assert_eq!(naming.key_for(&name), Some(&key));
        assert_eq!(naming.folder_name(&key).unwrap(), name);
        assert_eq!(naming.len(), 1);
    }

    #[test]
    fn test_empty_key_has_no_folder() {
        let mut naming = FolderNaming::new();
        assert_eq!(naming.folder_name(&ExtensionKey::none()), None);
        assert!(naming.is_empty());
        assert_eq!(naming.key_for("unknown Files"), None);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ExtensionKey::none().to_string(), "(none)");
        assert_eq!(ExtensionStyle::Last.classify("x.pdf").to_string(), ".pdf");
    }
}
