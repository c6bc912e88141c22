//! Hidden-entry detection.
//!
//! The scanner asks a [`HiddenPredicate`] about every entry it lists and drops
//! the ones reported hidden before anything else happens to them. The default,
//! [`SystemHidden`], checks the Windows hidden attribute where it exists and
//! falls back to the leading-dot convention everywhere else.

use std::path::Path;

/// Decides whether a directory entry is hidden.
pub trait HiddenPredicate {
    fn is_hidden(&self, path: &Path) -> bool;
}

impl<F> HiddenPredicate for F
where
    F: Fn(&Path) -> bool,
{
    fn is_hidden(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Treats names starting with `.` as hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotPrefix;

impl HiddenPredicate for DotPrefix {
    fn is_hidden(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
    }
}

/// Uses the platform's notion of hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHidden;

#[cfg(windows)]
impl HiddenPredicate for SystemHidden {
    fn is_hidden(&self, path: &Path) -> bool {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

        // An entry we cannot stat is left alone.
        match std::fs::symlink_metadata(path) {
            Ok(meta) => meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0,
            Err(_) => true,
        }
    }
}

#[cfg(not(windows))]
impl HiddenPredicate for SystemHidden {
    fn is_hidden(&self, path: &Path) -> bool {
        DotPrefix.is_hidden(path)
    }
}
