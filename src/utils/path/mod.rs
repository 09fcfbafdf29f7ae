//! Path and URL utilities.
//!
//! - [`web`]: web-path helpers (`dirname`, `basename`, `stem`, `extension`)
//! - [`DocRoot`]: mapping from web paths (`/js/a.js`) to files on disk

pub mod web;

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to joining relative paths with the current directory.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Document root of the site: every web path is resolved below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRoot(PathBuf);

impl DocRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// `/js/a.js` → `<doc_root>/js/a.js`.
    ///
    /// Doubled slashes collapse, so `"//js/a.js"` and `"js/a.js"` map to the
    /// same file.
    pub fn to_fs(&self, web_path: &str) -> PathBuf {
        web_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.0.clone(), |acc, part| acc.join(part))
    }
}
