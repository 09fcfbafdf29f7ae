//! Single-file script minification through the artifact cache.

use std::collections::BTreeMap;

use super::{Publisher, PublishError, single_key};
use crate::cache::{ArtifactCache, ArtifactClass, ArtifactRecord, ModTimes, Validity, is_temporary};
use crate::config::PipelineConfig;
use crate::freshness::mod_time_or_zero;
use crate::registry::AssetKind;
use crate::stage::{CompileJob, JobQueue};
use crate::utils::hash::options_hash;
use crate::utils::path::web;

/// Where a script request ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinifyOutcome {
    /// Serve the unminified source (missing, conflicting or failed build).
    Original(String),
    /// Minified artifact built by the compiler.
    Final(String),
    /// Fallback artifact; the compiler build is still staged.
    Temporary(String),
}

impl MinifyOutcome {
    pub fn path(&self) -> &str {
        match self {
            Self::Original(p) | Self::Final(p) | Self::Temporary(p) => p,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

/// Minifies one script at a time, reusing valid artifacts.
#[derive(Debug)]
pub struct JsMinifier<'a> {
    config: &'a PipelineConfig,
    queue: &'a dyn JobQueue,
}

impl<'a> JsMinifier<'a> {
    pub fn new(config: &'a PipelineConfig, queue: &'a dyn JobQueue) -> Self {
        Self { config, queue }
    }

    /// Minified path for `path`, building it when stale.
    ///
    /// `requested` options are overlaid on the configured defaults (only
    /// customizable keys). A non-empty request whose options differ from
    /// the existing artifact's is refused: the artifact is left alone and
    /// the source is served.
    pub fn minify(&self, path: &str, requested: &BTreeMap<String, String>) -> MinifyOutcome {
        let min_dir = self.config.min_dir(AssetKind::Script);
        if path.starts_with(min_dir) {
            return MinifyOutcome::Original(path.to_owned());
        }

        let doc_root = self.config.doc_root();
        let source = doc_root.to_fs(path);
        if !source.is_file() {
            return MinifyOutcome::Original(path.to_owned());
        }

        let options = self.config.js.merged_options(requested);
        let hash = options_hash(&options);
        let key = single_key(path, AssetKind::Script);
        let artifact_dir = self.config.artifact_dir(AssetKind::Script);
        let artifact = artifact_dir.join(&key);
        let artifact_web = web::join(min_dir, &key);
        let mtime = mod_time_or_zero(&source);

        let cache = ArtifactCache::open(&artifact_dir);
        let validity = cache.check(
            ArtifactClass::Single,
            &key,
            &artifact,
            &ModTimes::Single(mtime),
            &hash,
            !requested.is_empty(),
        );

        match validity {
            Validity::Valid if is_temporary(&artifact) => MinifyOutcome::Temporary(artifact_web),
            Validity::Valid => MinifyOutcome::Final(artifact_web),
            Validity::Conflict => {
                log!("warning"; "{} was already minified with different options, serving source", path);
                MinifyOutcome::Original(path.to_owned())
            }
            Validity::Stale => {
                let job = CompileJob::new(vec![source], &artifact, options);
                let publisher = Publisher::new(self.queue, self.config.js.temporary);
                let temporary = match publisher.publish(AssetKind::Script, job) {
                    Ok(temporary) => temporary,
                    Err(e) => {
                        report(&e);
                        return MinifyOutcome::Original(path.to_owned());
                    }
                };

                let record = ArtifactRecord::new(ModTimes::Single(mtime), hash, vec![path.to_owned()]);
                if !cache.commit(ArtifactClass::Single, &key, record) {
                    return MinifyOutcome::Original(path.to_owned());
                }

                if temporary {
                    MinifyOutcome::Temporary(artifact_web)
                } else {
                    MinifyOutcome::Final(artifact_web)
                }
            }
        }
    }
}

fn report(e: &PublishError) {
    let source = std::error::Error::source(e)
        .map(ToString::to_string)
        .unwrap_or_default();
    log!("warning"; "{}: {}", e, source);
}
