//! Cache record data structures.

use serde::{Deserialize, Serialize};

use crate::freshness::ModTime;

/// Source modification time(s) an artifact was built from.
///
/// Single-file artifacts store one integer, bundles an ordered list; the
/// order is part of the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModTimes {
    Single(ModTime),
    Ordered(Vec<ModTime>),
}

/// Metadata about one built artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Source mtimes observed when the artifact was built
    pub source_mod_times: ModTimes,
    /// Hash of the build options (empty for plain concatenation)
    #[serde(default)]
    pub options_hash: String,
    /// Source web paths, in build order
    #[serde(default)]
    pub source_files: Vec<String>,
}

impl ArtifactRecord {
    pub fn new(
        source_mod_times: ModTimes,
        options_hash: impl Into<String>,
        source_files: Vec<String>,
    ) -> Self {
        Self {
            source_mod_times,
            options_hash: options_hash.into(),
            source_files,
        }
    }
}

/// Outcome of comparing a record against the current source state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Artifact on disk matches the sources.
    Valid,
    /// Artifact missing, never recorded, or built from other sources.
    Stale,
    /// Custom options were requested but the artifact was built with
    /// different ones. The caller must not rebuild over it.
    Conflict,
}

impl Validity {
    /// Decide whether a cached artifact can be reused.
    ///
    /// The conflict check comes before the mtime check: an artifact built
    /// with other options stays a conflict even after its source changed.
    pub fn check(
        record: Option<&ArtifactRecord>,
        artifact_exists: bool,
        current: &ModTimes,
        options_hash: &str,
        custom_options: bool,
    ) -> Self {
        let Some(record) = record else {
            return Self::Stale;
        };
        if !artifact_exists {
            return Self::Stale;
        }
        if custom_options && record.options_hash != options_hash {
            return Self::Conflict;
        }
        if record.source_mod_times != *current {
            return Self::Stale;
        }
        Self::Valid
    }
}
