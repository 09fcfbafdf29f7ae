//! Pipeline configuration (`respipe.toml`).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [site], [js], [css]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file discovery
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section       | Purpose                                          |
//! |---------------|--------------------------------------------------|
//! | `[site]`      | Document root, static host, minification policy  |
//! | `[js]`        | Script artifacts, compiler, staging              |
//! | `[css]`       | Stylesheet artifacts, `$(var)` values            |
//! | `[resources]` | Version registry: name → path(s) and version     |
//!
//! The configuration is loaded once and passed to the
//! [`Resolver`](crate::resolver::Resolver) by value; nothing reads it
//! through globals.

pub mod section;
pub mod types;
mod util;

pub use section::{ScriptConfig, SiteConfig, StageConfig, StageMode, StyleConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::registry::{AssetKind, VersionRegistry};
use crate::utils::path::{DocRoot, normalize_path};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

/// Default config file name.
pub const CONFIG_FILE: &str = "respipe.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing respipe.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub js: ScriptConfig,

    #[serde(default)]
    pub css: StyleConfig,

    #[serde(default)]
    pub resources: VersionRegistry,
}

impl PipelineConfig {
    /// Load configuration.
    ///
    /// An explicit `path` is used as given; otherwise `respipe.toml` is
    /// searched upward from the current directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
        let config_path = match path {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
            None => find_config_file(&cwd, Path::new(CONFIG_FILE))
                .ok_or_else(|| ConfigError::NotFound(PathBuf::from(CONFIG_FILE)))?,
        };

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.finalize(&root);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Resolve relative paths against `root` and normalize the registry.
    pub fn finalize(&mut self, root: &Path) {
        self.root = normalize_path(root);
        self.site.normalize(&self.root);
        self.js.stage.normalize(&self.root);
        self.resources.normalize();
    }

    /// Builder-style override of the document root (already absolute).
    pub fn with_doc_root(mut self, doc_root: impl Into<PathBuf>) -> Self {
        self.site.doc_root = doc_root.into();
        self
    }

    pub fn doc_root(&self) -> DocRoot {
        DocRoot::new(&self.site.doc_root)
    }

    /// Web directory holding artifacts of `kind` (`/js/min/`).
    pub fn min_dir(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Script => &self.js.min_dir,
            AssetKind::Style => &self.css.min_dir,
        }
    }

    /// Absolute directory holding artifacts of `kind`.
    pub fn artifact_dir(&self, kind: AssetKind) -> PathBuf {
        self.doc_root().to_fs(self.min_dir(kind))
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collect all validation errors and return them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.js.validate(&mut diag);
        self.css.validate(&mut diag);
        self.validate_resources(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    fn validate_resources(&self, diag: &mut ConfigDiagnostics) {
        let mut names: Vec<_> = self.resources.iter().collect();
        names.sort_by_key(|(name, _)| *name);

        for (name, entry) in names {
            for spec in entry.specs() {
                if !spec.path.starts_with('/') {
                    diag.error_with_hint(
                        FieldPath::owned(format!("resources.{name}.path")),
                        format!("`{}` is not a web path", spec.path),
                        "paths are relative to `site.doc_root` and start with `/`",
                    );
                }
            }
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Finalized config whose document root is `doc_root`.
#[cfg(test)]
pub fn test_config(doc_root: &Path, extra: &str) -> PipelineConfig {
    let mut config = test_parse_config(extra);
    config.finalize(doc_root);
    config.with_doc_root(normalize_path(doc_root))
}

// ============================================================================
// tests
// ============================================================================
