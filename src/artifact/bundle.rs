//! Bundles: several resolved resources joined into one artifact.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::{PublishError, Publisher, bundle_key, ensure_writable, write_atomic};
use crate::cache::{ArtifactCache, ArtifactClass, ArtifactRecord, ModTimes, Validity, is_temporary, temp_flag};
use crate::config::PipelineConfig;
use crate::freshness::ModTime;
use crate::minify::strip_leading_comment;
use crate::registry::AssetKind;
use crate::stage::{CompileJob, JobQueue};
use crate::utils::hash::options_hash;
use crate::utils::path::web;

/// Ordered bundle inputs. The three lists are index-aligned.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub kind: AssetKind,
    /// Paths the bundle is built from (crushed paths for stylesheets).
    pub paths: Vec<String>,
    /// Paths the caller asked for, recorded as the bundle's sources.
    pub sources: Vec<String>,
    /// Mtime of each entry in `paths`, `0` when missing.
    pub mod_times: Vec<ModTime>,
    /// Build through the compiler instead of plain concatenation.
    pub minify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltBundle {
    /// Web path of the bundle.
    pub path: String,
    pub temporary: bool,
}

#[derive(Debug)]
pub struct BundleBuilder<'a> {
    config: &'a PipelineConfig,
    queue: &'a dyn JobQueue,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(config: &'a PipelineConfig, queue: &'a dyn JobQueue) -> Self {
        Self { config, queue }
    }

    /// Reuse or rebuild the bundle for `request`.
    ///
    /// Only [`PublishError::Write`] is returned: a bundle has no single
    /// source to fall back to. Cache and staging problems are logged.
    pub fn build(&self, request: &BundleRequest) -> Result<BuiltBundle, PublishError> {
        let kind = request.kind;
        let min_dir = self.config.min_dir(kind);
        let dir = self.config.artifact_dir(kind);
        let last_source = request.sources.last().map(String::as_str).unwrap_or_default();
        let key = bundle_key(&request.paths, last_source, kind);
        let artifact = dir.join(&key);
        let path = web::join(min_dir, &key);

        fs::create_dir_all(&dir).map_err(|e| PublishError::Write(dir.clone(), e))?;
        ensure_writable(&artifact)?;

        let two_phase = kind == AssetKind::Script && request.minify;
        let hash = if two_phase {
            options_hash(&self.config.js.options)
        } else {
            String::new()
        };

        let cache = ArtifactCache::open(&dir);
        let current = ModTimes::Ordered(request.mod_times.clone());
        if cache.check(ArtifactClass::Bundle, &key, &artifact, &current, &hash, false) == Validity::Valid {
            return Ok(BuiltBundle {
                temporary: is_temporary(&artifact),
                path,
            });
        }

        let files = self.existing_files(&request.paths);
        let temporary = if two_phase {
            let job = CompileJob::new(files.clone(), &artifact, self.config.js.options.clone());
            match Publisher::new(self.queue, self.config.js.temporary).publish(kind, job) {
                Ok(temporary) => temporary,
                Err(e @ PublishError::Write(..)) => return Err(e),
                Err(e) => {
                    log!("warning"; "{}, serving unfinished bundle", e);
                    if !self.config.js.temporary {
                        // nothing was written yet
                        concatenate(&files, &artifact)?;
                        return Ok(BuiltBundle { path, temporary: false });
                    }
                    return Ok(BuiltBundle { path, temporary: true });
                }
            }
        } else {
            concatenate(&files, &artifact)?;
            false
        };

        let record = ArtifactRecord::new(current, hash, request.sources.clone());
        cache.commit(ArtifactClass::Bundle, &key, record);
        Ok(BuiltBundle { path, temporary })
    }

    fn existing_files(&self, paths: &[String]) -> Vec<PathBuf> {
        let doc_root = self.config.doc_root();
        paths
            .iter()
            .map(|p| doc_root.to_fs(p))
            .filter(|p| p.is_file())
            .collect()
    }
}

/// Join `files`, dropping each one's leading comment header.
fn concatenate(files: &[PathBuf], artifact: &std::path::Path) -> Result<(), PublishError> {
    let mut bundle = String::new();
    for file in files {
        let content = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(PublishError::Write(artifact.to_path_buf(), e)),
        };
        if !bundle.is_empty() && !bundle.ends_with('\n') {
            bundle.push('\n');
        }
        bundle.push_str(&strip_leading_comment(&content));
    }
    write_atomic(artifact, bundle.as_bytes())?;

    // A plain rewrite supersedes any staged build
    let _ = fs::remove_file(temp_flag(artifact));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::freshness::mod_time_or_zero;
    use crate::freshness::mtime::set_mod_time;
    use crate::stage::{DirQueue, JobRunner};
    use std::path::Path;
    use tempfile::TempDir;

    fn setup(extra: &str) -> (TempDir, PipelineConfig, DirQueue) {
        let dir = TempDir::new().unwrap();
        let www = dir.path().join("www");
        fs::create_dir_all(www.join("js")).unwrap();
        fs::create_dir_all(www.join("css")).unwrap();
        fs::write(www.join("js/a.js"), "/* a header */\nwindow.a = 1;\n").unwrap();
        fs::write(www.join("js/b.js"), "/*! b header */\nwindow.b = 2;\n").unwrap();
        fs::write(www.join("css/a.css"), "/* theme */\n.a { color: red; }\n").unwrap();
        fs::write(www.join("css/b.css"), ".b { color: blue; }\n").unwrap();
        let config = test_config(&www, extra);
        let queue = DirQueue::new(dir.path().join("staging"));
        (dir, config, queue)
    }

    fn request(config: &PipelineConfig, kind: AssetKind, paths: &[&str], minify: bool) -> BundleRequest {
        let root = config.doc_root();
        BundleRequest {
            kind,
            paths: paths.iter().map(|p| p.to_string()).collect(),
            sources: paths.iter().map(|p| p.to_string()).collect(),
            mod_times: paths.iter().map(|p| mod_time_or_zero(&root.to_fs(p))).collect(),
            minify,
        }
    }

    fn read(config: &PipelineConfig, path: &str) -> String {
        fs::read_to_string(config.doc_root().to_fs(path)).unwrap()
    }

    #[test]
    fn test_concat_strips_headers_in_order() {
        let (_dir, config, queue) = setup("");
        let builder = BundleBuilder::new(&config, &queue);
        let built = builder
            .build(&request(&config, AssetKind::Script, &["/js/a.js", "/js/b.js"], false))
            .unwrap();

        assert!(!built.temporary);
        assert!(built.path.starts_with("/js/min/bBNDL-"));
        assert_eq!(read(&config, &built.path), "window.a = 1;\nwindow.b = 2;\n");
        assert!(queue.pending().is_empty());
    }

    #[test]
    fn test_missing_member_contributes_nothing() {
        let (_dir, config, queue) = setup("");
        let builder = BundleBuilder::new(&config, &queue);
        let built = builder
            .build(&request(&config, AssetKind::Style, &["/css/gone.css", "/css/b.css"], false))
            .unwrap();
        assert!(built.path.starts_with("/css/min/bBNDL-"));
        assert_eq!(read(&config, &built.path), ".b { color: blue; }\n");
    }

    #[test]
    fn test_valid_bundle_is_reused() {
        let (_dir, config, queue) = setup("");
        let builder = BundleBuilder::new(&config, &queue);
        let req = request(&config, AssetKind::Style, &["/css/a.css", "/css/b.css"], false);
        let built = builder.build(&req).unwrap();

        // a hand edit survives while sources are unchanged
        let artifact = config.doc_root().to_fs(&built.path);
        fs::write(&artifact, "edited").unwrap();
        assert_eq!(builder.build(&req).unwrap(), built);
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "edited");

        // touching a member rebuilds
        let member = config.doc_root().to_fs("/css/b.css");
        set_mod_time(&member, mod_time_or_zero(&member) + 10);
        let req = request(&config, AssetKind::Style, &["/css/a.css", "/css/b.css"], false);
        builder.build(&req).unwrap();
        assert_ne!(fs::read_to_string(&artifact).unwrap(), "edited");
    }

    #[test]
    fn test_order_gives_distinct_bundles() {
        let (_dir, config, queue) = setup("");
        let builder = BundleBuilder::new(&config, &queue);
        let ab = builder
            .build(&request(&config, AssetKind::Script, &["/js/a.js", "/js/b.js"], false))
            .unwrap();
        let ba = builder
            .build(&request(&config, AssetKind::Script, &["/js/b.js", "/js/a.js"], false))
            .unwrap();
        assert_ne!(ab.path, ba.path);
        assert_eq!(read(&config, &ba.path), "window.b = 2;\nwindow.a = 1;\n");
    }

    #[test]
    fn test_minified_script_bundle_goes_through_staging() {
        let (_dir, config, queue) = setup("");
        let builder = BundleBuilder::new(&config, &queue);
        let req = request(&config, AssetKind::Script, &["/js/a.js", "/js/b.js"], true);

        let built = builder.build(&req).unwrap();
        assert!(built.temporary);
        assert_eq!(queue.pending().len(), 1);

        queue.drain(&JobRunner::default());
        let done = builder.build(&req).unwrap();
        assert_eq!(done, BuiltBundle { path: built.path, temporary: false });
        assert!(queue.pending().is_empty());

        let cache = ArtifactCache::open(config.artifact_dir(AssetKind::Script));
        let record = cache
            .lookup(ArtifactClass::Bundle, web::basename(&done.path))
            .unwrap();
        assert_eq!(record.source_files, vec!["/js/a.js".to_string(), "/js/b.js".to_string()]);
        assert!(matches!(record.source_mod_times, ModTimes::Ordered(ref t) if t.len() == 2));
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_bundle_dir_is_error() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, config, queue) = setup("");
        let min = config.artifact_dir(AssetKind::Style);
        fs::create_dir_all(&min).unwrap();
        fs::set_permissions(&min, fs::Permissions::from_mode(0o555)).unwrap();
        // root ignores directory permissions
        if fs::write(min.join("probe"), "").is_ok() {
            return;
        }

        let err = BundleBuilder::new(&config, &queue)
            .build(&request(&config, AssetKind::Style, &["/css/a.css", "/css/b.css"], false))
            .unwrap_err();
        assert!(matches!(err, PublishError::Write(..)));
        fs::set_permissions(&min, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_concatenate_skips_vanished_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.js");
        let a = dir.path().join("a.js");
        fs::write(&a, "x;").unwrap();
        concatenate(&[a, Path::new("/nonexistent/b.js").to_path_buf()], &out).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "x;");
    }
}
