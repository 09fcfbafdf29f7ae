//! Version registry: logical resource names → paths and versions.
//!
//! ```toml
//! [resources]
//! imagefill = { path = "/js/imageFill.js", version = 2 }
//! select2-css = [
//!     { path = "/js/select2/select2.css" },
//!     { path = "/css/select2.custom.css", version = 3, crush = true },
//! ]
//! ```
//!
//! A name maps either to one resource or to a *group*, which resolves like a
//! list of its members (and therefore bundles).

mod kind;
mod spec;

pub use kind::AssetKind;
pub use spec::{ResourceRef, ResourceSpec};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Registry value: a single resource or an ordered group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryEntry {
    Single(ResourceSpec),
    Group(Vec<ResourceSpec>),
}

impl RegistryEntry {
    /// All member specs, in order.
    pub fn specs(&self) -> &[ResourceSpec] {
        match self {
            Self::Single(spec) => std::slice::from_ref(spec),
            Self::Group(specs) => specs,
        }
    }
}

/// Name → entry lookup table. Names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRegistry {
    entries: FxHashMap<String, RegistryEntry>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource or group, replacing any previous entry.
    pub fn insert(&mut self, name: &str, entry: RegistryEntry) {
        self.entries.insert(name.to_lowercase(), entry);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: &str, entry: impl Into<RegistryEntry>) -> Self {
        self.insert(name, entry.into());
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(&name.to_lowercase()))
    }

    /// Lowercase every key (config files may use any case).
    pub fn normalize(&mut self) {
        if self.entries.keys().all(|k| *k == k.to_lowercase()) {
            return;
        }
        self.entries = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<ResourceSpec> for RegistryEntry {
    fn from(spec: ResourceSpec) -> Self {
        Self::Single(spec)
    }
}

impl From<Vec<ResourceSpec>> for RegistryEntry {
    fn from(specs: Vec<ResourceSpec>) -> Self {
        Self::Group(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        let registry = VersionRegistry::new().with(
            "imageFill",
            ResourceSpec::new("/js/imageFill.js").with_version(2),
        );

        let entry = registry.lookup("IMAGEFILL").unwrap();
        assert_eq!(entry.specs()[0].path, "/js/imageFill.js");
        assert_eq!(entry.specs()[0].version(), 2);
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_deserialize_single_and_group() {
        #[derive(Deserialize)]
        struct Doc {
            resources: VersionRegistry,
        }

        let doc: Doc = toml::from_str(
            r#"
[resources]
qtip = { path = "/js/qtip.js", version = 1 }
Select2-CSS = [
    { path = "/js/select2/select2.css" },
    { path = "/css/select2.custom.css", version = 3, crush = true },
]
"#,
        )
        .unwrap();
        let mut registry = doc.resources;
        registry.normalize();

        assert!(matches!(registry.lookup("qtip"), Some(RegistryEntry::Single(_))));
        let group = registry.lookup("select2-css").unwrap();
        assert_eq!(group.specs().len(), 2);
        assert_eq!(group.specs()[1].crush, Some(true));
        assert_eq!(group.specs()[1].version(), 3);
    }
}
