//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! doc_root = "www"                         # relative to respipe.toml
//! host = "https://static.example.edu"      # prefixed to every URL
//! minify = true                            # global minification policy
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory web paths resolve against.
    pub doc_root: PathBuf,

    /// Static host prefix; empty for same-origin URLs.
    pub host: String,

    /// Minify scripts at all. Requests can opt out, never in.
    pub minify: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            doc_root: PathBuf::from("."),
            host: String::new(),
            minify: true,
        }
    }
}

impl SiteConfig {
    /// Expand `~` and resolve `doc_root` against the config directory.
    pub(in crate::config) fn normalize(&mut self, root: &Path) {
        let raw = self.doc_root.to_string_lossy();
        let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
        let full = if expanded.is_relative() {
            root.join(expanded)
        } else {
            expanded
        };
        self.doc_root = normalize_path(&full);
    }
}
