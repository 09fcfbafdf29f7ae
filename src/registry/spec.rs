//! Resource descriptions and references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::kind::AssetKind;

/// One physical asset and its declared version.
///
/// Pipeline steps never mutate a spec; rewriting the path (after crushing,
/// for example) produces a new one via [`ResourceSpec::with_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    /// Web path below the document root (`/js/imageFill.js`).
    pub path: String,
    /// Declared version; `None` means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Force (`true`) or suppress (`false`) crushing of a stylesheet,
    /// overriding the per-call crush option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crush: Option<bool>,
    /// Options for the script compiler (only customizable keys are honored).
    #[serde(default, alias = "jsMinOptions", skip_serializing_if = "BTreeMap::is_empty")]
    pub minify_options: BTreeMap<String, String>,
}

impl ResourceSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: None,
            crush: None,
            minify_options: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_crush(mut self, crush: bool) -> Self {
        self.crush = Some(crush);
        self
    }

    /// Copy of this spec pointing at another path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    /// Declared version, defaulting to 1.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.unwrap_or(1)
    }

    #[inline]
    pub fn kind(&self) -> Option<AssetKind> {
        AssetKind::from_path(&self.path)
    }

    /// Whether this stylesheet should go through the crush transform.
    ///
    /// The per-resource flag wins; without one, the call-level option
    /// decides.
    pub fn wants_crush(&self, crush_requested: bool) -> bool {
        self.kind() == Some(AssetKind::Style) && self.crush.unwrap_or(crush_requested)
    }
}

/// A request for one or more resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    /// Registry name (case-insensitive).
    Name(String),
    /// Literal resource.
    Spec(ResourceSpec),
    /// Ordered list; two or more members form a bundle.
    Group(Vec<ResourceRef>),
}

impl ResourceRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::Spec(ResourceSpec::new(path))
    }

    /// Parse a command-line reference: `/path[@version]` or a registry name.
    pub fn parse(input: &str) -> Self {
        if !input.starts_with('/') {
            return Self::Name(input.to_string());
        }
        match input.rsplit_once('@') {
            Some((path, version)) => match version.parse() {
                Ok(v) => Self::Spec(ResourceSpec::new(path).with_version(v)),
                Err(_) => Self::path(input),
            },
            None => Self::path(input),
        }
    }
}

impl From<ResourceSpec> for ResourceRef {
    fn from(spec: ResourceSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<&str> for ResourceRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl<T: Into<ResourceRef>> From<Vec<T>> for ResourceRef {
    fn from(items: Vec<T>) -> Self {
        Self::Group(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defaults_to_one() {
        assert_eq!(ResourceSpec::new("/js/a.js").version(), 1);
        assert_eq!(ResourceSpec::new("/js/a.js").with_version(0).version(), 0);
    }

    #[test]
    fn test_wants_crush() {
        let css = ResourceSpec::new("/css/a.css");
        assert!(css.wants_crush(true));
        assert!(!css.wants_crush(false));
        assert!(css.clone().with_crush(true).wants_crush(false));
        assert!(!css.with_crush(false).wants_crush(true));
        assert!(!ResourceSpec::new("/js/a.js").with_crush(true).wants_crush(true));
    }

    #[test]
    fn test_with_path_keeps_version() {
        let spec = ResourceSpec::new("/css/a.css").with_version(3);
        let moved = spec.with_path("/css/min/a-1.css");
        assert_eq!(moved.path, "/css/min/a-1.css");
        assert_eq!(moved.version(), 3);
        assert_eq!(spec.path, "/css/a.css");
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(ResourceRef::parse("imagefill"), ResourceRef::name("imagefill"));
        assert_eq!(ResourceRef::parse("/js/a.js"), ResourceRef::path("/js/a.js"));
        assert_eq!(
            ResourceRef::parse("/js/a.js@3"),
            ResourceRef::Spec(ResourceSpec::new("/js/a.js").with_version(3))
        );
        assert_eq!(ResourceRef::parse("/js/x@y.js"), ResourceRef::path("/js/x@y.js"));
    }

    #[test]
    fn test_deserialize_legacy_option_key() {
        let spec: ResourceSpec = toml::from_str(
            "path = \"/js/a.js\"\nversion = 2\n[jsMinOptions]\ncompilation_level = \"ADVANCED\"",
        )
        .unwrap();
        assert_eq!(spec.version(), 2);
        assert_eq!(spec.minify_options["compilation_level"], "ADVANCED");
    }
}
