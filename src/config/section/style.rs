//! `[css]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [css]
//! min_dir = "/css/min/"
//! vars_version = 2          # bump when a variable value changes
//!
//! [css.vars]
//! brand = "#004990"         # `$(brand)` in stylesheets
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::validate_artifact_dir;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Web directory for crushed stylesheets and style bundles.
    pub min_dir: String,

    /// Added to the version of every crushed stylesheet.
    pub vars_version: u64,

    /// Values substituted for `$(name)` placeholders.
    pub vars: BTreeMap<String, String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            min_dir: "/css/min/".into(),
            vars_version: 0,
            vars: BTreeMap::new(),
        }
    }
}

impl StyleConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_artifact_dir(&self.min_dir, FieldPath::new("css.min_dir"), diag);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_style_config() {
        let config = test_parse_config(
            "[css]\nmin_dir = \"/styles/min/\"\nvars_version = 3\n[css.vars]\nbrand = \"#004990\"",
        );
        assert_eq!(config.css.min_dir, "/styles/min/");
        assert_eq!(config.css.vars_version, 3);
        assert_eq!(config.css.vars["brand"], "#004990");
    }

    #[test]
    fn test_relative_min_dir_rejected() {
        let config = test_parse_config("[css]\nmin_dir = \"css/min\"");
        let mut diag = ConfigDiagnostics::new();
        config.css.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "css.min_dir");
    }
}
