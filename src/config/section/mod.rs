//! Configuration sections of `respipe.toml`.

mod script;
mod site;
mod style;

pub use script::{ScriptConfig, StageConfig, StageMode};
pub use site::SiteConfig;
pub use style::StyleConfig;

use super::{ConfigDiagnostics, FieldPath};

/// Artifact directories are web paths like `/js/min/`.
pub(super) fn validate_artifact_dir(dir: &str, field: FieldPath, diag: &mut ConfigDiagnostics) {
    if !dir.starts_with('/') || !dir.ends_with('/') {
        diag.error_with_hint(
            field,
            format!("`{dir}` is not an absolute web directory"),
            "start and end it with `/`, e.g. \"/js/min/\"",
        );
    }
}
