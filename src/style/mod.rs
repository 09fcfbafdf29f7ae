//! Stylesheet crushing: `$(var)` substitution plus minification.
//!
//! Crushed output goes to the stylesheet artifact directory under the same
//! naming scheme as minified scripts. Freshness is decided by an embedded
//! content marker rather than the artifact cache, so changing a variable
//! value rebuilds even when the source file is untouched.

mod vars;

pub use vars::substitute;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::artifact::single_key;
use crate::artifact::{PublishError, write_atomic};
use crate::config::PipelineConfig;
use crate::freshness::{build_marker, compute_file_hash, is_fresh};
use crate::minify::minify_css;
use crate::registry::{AssetKind, ResourceSpec};
use crate::utils::hash::digest;
use crate::utils::path::{DocRoot, web};

/// How crushed output is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrushMethod {
    /// Write an artifact and return its spec.
    #[default]
    File,
    /// Return the styles as a `<style>` block.
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOptions {
    pub minify: bool,
    /// Per-call variables; configured `[css.vars]` override them.
    pub vars: BTreeMap<String, String>,
    pub method: CrushMethod,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            minify: true,
            vars: BTreeMap::new(),
            method: CrushMethod::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleOutput {
    /// Crushed artifact; the path is a web path, the version unchanged.
    File(ResourceSpec),
    Inline(String),
}

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("stylesheet `{0}` not found")]
    NotFound(String),

    #[error("couldn't read `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Write(#[from] PublishError),
}

/// External CSS transform.
pub trait StyleTransform: Send + Sync + std::fmt::Debug {
    fn crush(&self, spec: &ResourceSpec, options: &StyleOptions) -> Result<StyleOutput, StyleError>;
}

/// Built-in transform: lightningcss minification and `$(var)` values.
#[derive(Debug, Clone)]
pub struct CrushTransform {
    doc_root: DocRoot,
    min_dir: String,
    vars: BTreeMap<String, String>,
}

/// What the marker's options hash covers.
#[derive(Serialize)]
struct MarkerOptions<'a> {
    minify: bool,
    vars: &'a BTreeMap<String, String>,
}

impl CrushTransform {
    pub fn new(doc_root: DocRoot, min_dir: impl Into<String>, vars: BTreeMap<String, String>) -> Self {
        Self {
            doc_root,
            min_dir: min_dir.into(),
            vars,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.doc_root(), &config.css.min_dir, config.css.vars.clone())
    }

    fn render(&self, source: &str, options: &StyleOptions, vars: &BTreeMap<String, String>) -> String {
        let css = substitute(source, vars);
        if !options.minify {
            return css.into_owned();
        }
        minify_css(&css).unwrap_or_else(|| {
            crate::debug!("crush"; "stylesheet didn't parse, kept unminified");
            css.into_owned()
        })
    }
}

impl StyleTransform for CrushTransform {
    fn crush(&self, spec: &ResourceSpec, options: &StyleOptions) -> Result<StyleOutput, StyleError> {
        let source = self.doc_root.to_fs(&spec.path);
        if !source.is_file() {
            return Err(StyleError::NotFound(spec.path.clone()));
        }

        let mut vars = options.vars.clone();
        vars.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));

        if options.method == CrushMethod::Inline {
            let content =
                fs::read_to_string(&source).map_err(|e| StyleError::Read(source.clone(), e))?;
            return Ok(StyleOutput::Inline(format!(
                "<style>{}</style>",
                self.render(&content, options, &vars)
            )));
        }

        let key = single_key(&spec.path, AssetKind::Style);
        let web_path = web::join(&self.min_dir, &key);
        let output = self.doc_root.to_fs(&web_path);

        let marker_options = serde_json::to_string(&MarkerOptions {
            minify: options.minify,
            vars: &vars,
        })
        .unwrap_or_default();
        let options_hash = digest(&marker_options);

        if !is_fresh(&source, &output, &options_hash) {
            let content =
                fs::read_to_string(&source).map_err(|e| StyleError::Read(source.clone(), e))?;
            let source_hash = compute_file_hash(&source).unwrap_or_default();
            let css = self.render(&content, options, &vars);
            let body = format!("{}\n{css}", build_marker(&source_hash, &options_hash));
            write_atomic(&output, body.as_bytes())?;
            crate::debug!("crush"; "{} -> {}", spec.path, web_path);
        }

        Ok(StyleOutput::File(spec.with_path(web_path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CrushTransform) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(
            dir.path().join("css/site.css"),
            "/* site */\n.brand {\n  color: $(brand);\n  margin: $(gap);\n}\n",
        )
        .unwrap();
        let vars = BTreeMap::from([("brand".to_string(), "#004990".to_string())]);
        let transform = CrushTransform::new(DocRoot::new(dir.path()), "/css/min/", vars);
        (dir, transform)
    }

    fn options(minify: bool) -> StyleOptions {
        StyleOptions {
            minify,
            vars: BTreeMap::from([("gap".to_string(), "4px".to_string())]),
            method: CrushMethod::File,
        }
    }

    #[test]
    fn test_crush_to_file() {
        let (dir, transform) = setup();
        let spec = ResourceSpec::new("/css/site.css").with_version(3);

        let StyleOutput::File(crushed) = transform.crush(&spec, &options(true)).unwrap() else {
            panic!("expected file output");
        };
        assert!(crushed.path.starts_with("/css/min/site-"));
        assert_eq!(crushed.version(), 3);

        let out = fs::read_to_string(DocRoot::new(dir.path()).to_fs(&crushed.path)).unwrap();
        assert!(out.starts_with("/*respipe:hash:"));
        assert!(out.contains(".brand{color:#004990;margin:4px}"));
    }

    #[test]
    fn test_config_vars_win() {
        let (_dir, transform) = setup();
        let mut opts = options(false);
        opts.vars.insert("brand".into(), "red".into());
        opts.method = CrushMethod::Inline;

        let StyleOutput::Inline(html) = transform.crush(&ResourceSpec::new("/css/site.css"), &opts).unwrap()
        else {
            panic!("expected inline output");
        };
        assert!(html.starts_with("<style>"));
        assert!(html.contains("#004990"));
        assert!(!html.contains("red"));
    }

    #[test]
    fn test_rebuilds_when_vars_change() {
        let (dir, transform) = setup();
        let spec = ResourceSpec::new("/css/site.css");
        let StyleOutput::File(crushed) = transform.crush(&spec, &options(true)).unwrap() else {
            panic!("expected file output");
        };
        let output = DocRoot::new(dir.path()).to_fs(&crushed.path);

        let mut wider = options(true);
        wider.vars.insert("gap".into(), "8px".into());
        transform.crush(&spec, &wider).unwrap();
        assert!(fs::read_to_string(&output).unwrap().contains("margin:8px"));
    }

    #[test]
    fn test_fresh_output_is_not_rewritten() {
        let (dir, transform) = setup();
        let spec = ResourceSpec::new("/css/site.css");
        let StyleOutput::File(crushed) = transform.crush(&spec, &options(true)).unwrap() else {
            panic!("expected file output");
        };
        let output = DocRoot::new(dir.path()).to_fs(&crushed.path);

        // keep the marker, change the body
        let marked = fs::read_to_string(&output).unwrap();
        let marker = marked.lines().next().unwrap().to_string();
        fs::write(&output, format!("{marker}\n.kept{{}}")).unwrap();

        transform.crush(&spec, &options(true)).unwrap();
        assert!(fs::read_to_string(&output).unwrap().contains(".kept"));
    }

    #[test]
    fn test_missing_stylesheet() {
        let (_dir, transform) = setup();
        let err = transform
            .crush(&ResourceSpec::new("/css/none.css"), &options(true))
            .unwrap_err();
        assert!(matches!(err, StyleError::NotFound(_)));
    }
}
