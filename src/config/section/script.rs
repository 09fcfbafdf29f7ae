//! `[js]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [js]
//! min_dir = "/js/min/"
//! temporary = true              # serve a quick build while the real one is staged
//! customizable = ["language_in", "language_out", "compilation_level"]
//! compiler = ["java", "-jar", "/opt/closure/compiler.jar"]
//!
//! [js.options]
//! language_in = "ECMASCRIPT5"
//! compilation_level = "SIMPLE"
//!
//! [js.stage]
//! mode = "directory"            # or "worker"
//! dir = ".respipe/staging"
//! workers = 2
//! ```
//!
//! An empty `compiler` runs jobs with the built-in minifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::validate_artifact_dir;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Web directory for minified scripts and script bundles.
    pub min_dir: String,

    /// Write a fallback artifact before staging the real build.
    pub temporary: bool,

    /// Option keys a request may override.
    pub customizable: Vec<String>,

    /// Compiler command; empty uses the built-in minifier.
    pub compiler: Vec<String>,

    /// Default compiler options, passed as `--key value`.
    pub options: BTreeMap<String, String>,

    pub stage: StageConfig,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        let options = [("language_in", "ECMASCRIPT5"), ("compilation_level", "SIMPLE")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self {
            min_dir: "/js/min/".into(),
            temporary: true,
            customizable: ["language_in", "language_out", "compilation_level"]
                .map(String::from)
                .to_vec(),
            compiler: Vec::new(),
            options,
            stage: StageConfig::default(),
        }
    }
}

impl ScriptConfig {
    /// Defaults overlaid with the customizable subset of `requested`.
    ///
    /// Keys outside `customizable` are dropped silently.
    pub fn merged_options(&self, requested: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut options = self.options.clone();
        for (key, value) in requested {
            if self.customizable.iter().any(|k| k == key) {
                options.insert(key.clone(), value.clone());
            }
        }
        options
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_artifact_dir(&self.min_dir, FieldPath::new("js.min_dir"), diag);
        self.stage.validate(diag);

        let Some(program) = self.compiler.first() else {
            return;
        };
        if which::which(program).is_err() && !Path::new(program).exists() {
            diag.error_with_hint(
                FieldPath::new("js.compiler"),
                format!("`{program}` not found"),
                "install it, or leave `compiler` empty to use the built-in minifier",
            );
        }
    }
}

/// How staged compile jobs reach the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageMode {
    /// JSON job files in a watched directory, drained by `respipe worker`.
    #[default]
    Directory,
    /// In-process worker threads.
    Worker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub mode: StageMode,

    /// Staging directory (relative to respipe.toml).
    pub dir: PathBuf,

    /// Worker threads for `mode = "worker"`.
    pub workers: usize,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            mode: StageMode::Directory,
            dir: PathBuf::from(".respipe/staging"),
            workers: 2,
        }
    }
}

impl StageConfig {
    pub(in crate::config) fn normalize(&mut self, root: &Path) {
        if self.dir.is_relative() {
            self.dir = normalize_path(&root.join(&self.dir));
        }
    }

    fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.workers == 0 {
            diag.error(FieldPath::new("js.stage.workers"), "must be at least 1");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_script_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.js.min_dir, "/js/min/");
        assert!(config.js.temporary);
        assert!(config.js.compiler.is_empty());
        assert_eq!(config.js.options["compilation_level"], "SIMPLE");
        assert_eq!(config.js.stage.mode, StageMode::Directory);
        assert_eq!(config.js.stage.workers, 2);
    }

    #[test]
    fn test_stage_mode_parse() {
        let config = test_parse_config("[js.stage]\nmode = \"worker\"\nworkers = 4");
        assert_eq!(config.js.stage.mode, StageMode::Worker);
        assert_eq!(config.js.stage.workers, 4);
    }

    #[test]
    fn test_merged_options_keep_only_customizable() {
        let js = ScriptConfig::default();
        let requested: BTreeMap<String, String> = [
            ("compilation_level", "ADVANCED"),
            ("output_wrapper", "(function(){%output%})()"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let merged = js.merged_options(&requested);
        assert_eq!(merged["compilation_level"], "ADVANCED");
        assert_eq!(merged["language_in"], "ECMASCRIPT5");
        assert!(!merged.contains_key("output_wrapper"));
    }

    #[test]
    fn test_validate_workers_and_compiler() {
        let config = test_parse_config(
            "[js]\ncompiler = [\"respipe-no-such-compiler\"]\n[js.stage]\nworkers = 0",
        );
        let mut diag = ConfigDiagnostics::new();
        config.js.validate(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["js.stage.workers", "js.compiler"]);
    }
}
