//! Resource resolution: references in, versioned URLs out.
//!
//! ```text
//! ResourceRef ─► registry lookup ─┬─ one resource ─► crush | minify ─► URL
//!                                 └─ two or more ──► expand ─► BundleBuilder ─► URL
//! ```
//!
//! Every URL ends in `?v=<version>`, with a `tmp` suffix while a temporary
//! artifact is being served. Bundle versions are `Σ versions − (slots − 1)`:
//! five members at version 1 give version 1, and each bump anywhere moves
//! the bundle version by one.

mod error;
mod options;


pub use error::ResolveError;
pub use options::{Crush, ResolveOptions};

use std::sync::Arc;

use crate::artifact::{BundleBuilder, BundleRequest, JsMinifier};
use crate::cache::{ArtifactCache, TEMP_VERSION_SUFFIX};
use crate::config::PipelineConfig;
use crate::freshness::mod_time_or_zero;
use crate::registry::{AssetKind, RegistryEntry, ResourceRef, ResourceSpec};
use crate::stage::{JobQueue, queue_for};
use crate::style::{CrushTransform, StyleError, StyleOutput, StyleTransform};
use crate::utils::path::web;

/// One position in an expanded bundle list.
#[derive(Debug)]
enum Slot<'a> {
    /// Unknown name: takes a slot, adds no version.
    Missing,
    Member(&'a ResourceSpec),
}

#[derive(Debug, Clone)]
pub struct Resolver {
    config: PipelineConfig,
    queue: Arc<dyn JobQueue>,
    style: Arc<dyn StyleTransform>,
}

impl Resolver {
    /// Resolver with the queue from `[js.stage]` and the built-in crush
    /// transform.
    pub fn new(config: PipelineConfig) -> Self {
        let queue = queue_for(&config);
        Self::new_with_queue(config, queue)
    }

    /// Resolver staging builds on `queue` instead of the configured one.
    pub fn new_with_queue(config: PipelineConfig, queue: Arc<dyn JobQueue>) -> Self {
        let style = Arc::new(CrushTransform::from_config(&config));
        Self {
            config,
            queue,
            style,
        }
    }

    pub fn with_style(mut self, style: Arc<dyn StyleTransform>) -> Self {
        self.style = style;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve `request` to a URL.
    ///
    /// Unknown names give `""`. Errors are limited to mixing stylesheets
    /// with scripts, bundling files of neither type, and failing to write a
    /// bundle.
    pub fn resolve(&self, request: &ResourceRef, options: &ResolveOptions) -> Result<String, ResolveError> {
        match request {
            ResourceRef::Name(name) => match self.config.resources.lookup(name) {
                None => {
                    debug!("resolve"; "unknown resource `{}`", name);
                    Ok(String::new())
                }
                Some(RegistryEntry::Single(spec)) => Ok(self.resolve_single(spec, options)),
                Some(RegistryEntry::Group(specs)) => match specs.as_slice() {
                    [] => Ok(String::new()),
                    [spec] => Ok(self.resolve_single(spec, options)),
                    _ => {
                        let refs: Vec<_> = specs.iter().cloned().map(ResourceRef::Spec).collect();
                        self.resolve_bundle(&refs, options)
                    }
                },
            },
            ResourceRef::Spec(spec) => Ok(self.resolve_single(spec, options)),
            ResourceRef::Group(items) => match items.as_slice() {
                [] => Ok(String::new()),
                [item] => self.resolve(item, options),
                _ => self.resolve_bundle(items, options),
            },
        }
    }

    /// Source files recorded for a built artifact (`imageFill-<hash>.js`).
    pub fn source_files(&self, artifact: &str) -> Option<Vec<String>> {
        let kinds = match AssetKind::from_path(artifact) {
            Some(kind) => vec![kind],
            None => vec![AssetKind::Script, AssetKind::Style],
        };
        kinds.into_iter().find_map(|kind| {
            ArtifactCache::open(self.config.artifact_dir(kind)).source_files(web::basename(artifact))
        })
    }

    // ========================================================================
    // single resource
    // ========================================================================

    fn resolve_single(&self, spec: &ResourceSpec, options: &ResolveOptions) -> String {
        let version = spec.version();

        if spec.wants_crush(options.crush.requested()) {
            let style_options = options
                .crush
                .style_options(options.minify && self.config.site.minify);
            match self.style.crush(spec, &style_options) {
                Ok(StyleOutput::File(crushed)) => {
                    let version = crushed.version() + self.config.css.vars_version;
                    debug!("resolve"; "{} <- {}", crushed.path, spec.path);
                    return self.url(&crushed.path, &version.to_string(), options);
                }
                Ok(StyleOutput::Inline(content)) => return content,
                Err(e) => report_style_error(&e),
            }
        }

        if spec.kind() == Some(AssetKind::Script) && options.minify && self.config.site.minify {
            let minifier = JsMinifier::new(&self.config, self.queue.as_ref());
            let outcome = minifier.minify(&spec.path, &spec.minify_options);
            let mut version = version.to_string();
            if outcome.is_temporary() {
                version.push_str(TEMP_VERSION_SUFFIX);
            }
            if outcome.path() != spec.path {
                debug!("resolve"; "{} <- {}", outcome.path(), spec.path);
            }
            return self.url(outcome.path(), &version, options);
        }

        self.url(&spec.path, &version.to_string(), options)
    }

    // ========================================================================
    // bundles
    // ========================================================================

    fn resolve_bundle(&self, items: &[ResourceRef], options: &ResolveOptions) -> Result<String, ResolveError> {
        let slots = self.expand(items);

        let mut kind = None;
        let mut version_sum: i64 = 0;
        let mut sources = Vec::with_capacity(slots.len());
        let mut paths = Vec::with_capacity(slots.len());
        let mut mod_times = Vec::with_capacity(slots.len());
        let doc_root = self.config.doc_root();

        for slot in &slots {
            let Slot::Member(spec) = slot else {
                continue;
            };
            let Some(found) = spec.kind() else {
                return Err(ResolveError::UnsupportedType(spec.path.clone()));
            };
            match kind {
                None => kind = Some(found),
                Some(expected) if expected != found => {
                    return Err(ResolveError::MixedResourceTypes {
                        expected,
                        path: spec.path.clone(),
                    });
                }
                Some(_) => {}
            }

            sources.push(spec.path.clone());
            let member = self.bundle_member(spec, options);
            mod_times.push(mod_time_or_zero(&doc_root.to_fs(&member.path)));
            version_sum += member.version() as i64;
            paths.push(member.path);
        }

        // Nothing resolved.
        let Some(kind) = kind else {
            return Ok(String::new());
        };

        let request = BundleRequest {
            kind,
            paths,
            sources,
            mod_times,
            minify: self.config.site.minify,
        };
        let built = BundleBuilder::new(&self.config, self.queue.as_ref())
            .build(&request)
            .map_err(ResolveError::BundleWrite)?;

        trace_bundle(&built.path, &request);

        let aggregate = version_sum - (slots.len() as i64 - 1);
        let mut version = aggregate.to_string();
        if built.temporary {
            version.push_str(TEMP_VERSION_SUFFIX);
        }
        Ok(self.url(&built.path, &version, options))
    }

    /// Flatten `items`, expanding registry groups (and nested lists) in place.
    fn expand<'a>(&'a self, items: &'a [ResourceRef]) -> Vec<Slot<'a>> {
        let mut slots = Vec::with_capacity(items.len());
        for item in items {
            match item {
                ResourceRef::Name(name) => match self.config.resources.lookup(name) {
                    Some(entry) => slots.extend(entry.specs().iter().map(Slot::Member)),
                    None => slots.push(Slot::Missing),
                },
                ResourceRef::Spec(spec) => slots.push(Slot::Member(spec)),
                ResourceRef::Group(inner) => slots.extend(self.expand(inner)),
            }
        }
        slots
    }

    /// The resource a bundle actually reads: crushed stylesheets are swapped for
    /// their crushed artifact, versioned like a crushed single resource.
    fn bundle_member(&self, spec: &ResourceSpec, options: &ResolveOptions) -> ResourceSpec {
        if !spec.wants_crush(options.crush.requested()) {
            return spec.clone();
        }
        let style_options = options.crush.member_options(self.config.site.minify);
        match self.style.crush(spec, &style_options) {
            Ok(StyleOutput::File(crushed)) => {
                let version = crushed.version() + self.config.css.vars_version;
                crushed.with_version(version)
            }
            Ok(StyleOutput::Inline(_)) => spec.clone(),
            Err(e) => {
                report_style_error(&e);
                spec.clone()
            }
        }
    }

    fn url(&self, path: &str, version: &str, options: &ResolveOptions) -> String {
        let host = if options.include_host {
            self.config.site.host.as_str()
        } else {
            ""
        };
        format!("{host}{path}?v={version}")
    }
}

fn report_style_error(e: &StyleError) {
    match e {
        StyleError::NotFound(_) => debug!("crush"; "{}", e),
        _ => log!("warning"; "{}", e),
    }
}

fn trace_bundle(path: &str, request: &BundleRequest) {
    crate::debug_do! {
        log!("resolve"; "{} <- {}", path, request.sources.join(", "));
        if request.paths != request.sources {
            log!("resolve"; "  built from {}", request.paths.join(", "));
        }
    }
}
