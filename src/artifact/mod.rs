//! Building artifacts: single minified scripts and bundles.
//!
//! Rebuilds that need the slow compiler go through a two-phase publish:
//!
//! 1. write a quick fallback artifact, then its `.tmpFlag` sidecar;
//! 2. stage the authoritative build on the [`JobQueue`];
//! 3. the runner later replaces the artifact and removes the flag.
//!
//! Until step 3 lands, resolution serves the fallback with a `tmp` version
//! suffix, so the URL changes once the final build exists.

mod bundle;
mod key;
mod script;

pub use bundle::{BuiltBundle, BundleBuilder, BundleRequest};
pub use key::{bundle_key, single_key};
pub use script::{JsMinifier, MinifyOutcome};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cache::temp_flag;
use crate::registry::AssetKind;
use crate::minify::minify_files;
use crate::stage::{CompileJob, JobQueue, StageError};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("couldn't write `{0}`")]
    Write(PathBuf, #[source] io::Error),

    #[error("couldn't stage build of `{0}`")]
    Stage(PathBuf, #[source] StageError),
}

/// Two-phase publication of one artifact.
#[derive(Debug, Clone, Copy)]
pub struct Publisher<'a> {
    queue: &'a dyn JobQueue,
    /// Write a fallback artifact before staging.
    temporary: bool,
}

impl<'a> Publisher<'a> {
    pub fn new(queue: &'a dyn JobQueue, temporary: bool) -> Self {
        Self { queue, temporary }
    }

    /// Publish `job`. Returns whether the artifact on disk is temporary.
    ///
    /// A fallback write failure happens before anything is staged; a
    /// staging failure leaves the fallback (and its flag) in place.
    pub fn publish(&self, kind: AssetKind, job: CompileJob) -> Result<bool, PublishError> {
        if self.temporary {
            write_fallback(kind, &job.sources, &job.destination)?;
        }
        let destination = job.destination.clone();
        self.queue
            .stage(job)
            .map_err(|e| PublishError::Stage(destination, e))?;
        Ok(self.temporary)
    }
}

/// Write the in-process build of `sources` to `destination`, then the flag.
fn write_fallback(kind: AssetKind, sources: &[PathBuf], destination: &Path) -> Result<(), PublishError> {
    let code = minify_files(kind, sources)
        .map_err(|e| PublishError::Write(destination.to_path_buf(), e))?;
    write_atomic(destination, code.as_bytes())?;

    let flag = temp_flag(destination);
    fs::write(&flag, "temporary flag").map_err(|e| PublishError::Write(flag, e))
}

/// Write through a sibling temp file and rename over `path`.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<(), PublishError> {
    let fail = |e| PublishError::Write(path.to_path_buf(), e);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(fail)?;
    }
    ensure_writable(path)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", std::process::id()));
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content).map_err(fail)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        fail(e)
    })
}

/// A read-only artifact is never replaced, even though its directory would
/// allow the rename.
pub(crate) fn ensure_writable(path: &Path) -> Result<(), PublishError> {
    match fs::metadata(path) {
        Ok(meta) if meta.permissions().readonly() => Err(PublishError::Write(
            path.to_path_buf(),
            io::Error::new(io::ErrorKind::PermissionDenied, "artifact is read-only"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{DirQueue, JobHandle};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct ClosedQueue;

    impl JobQueue for ClosedQueue {
        fn stage(&self, _job: CompileJob) -> Result<JobHandle, StageError> {
            Err(StageError::Closed)
        }
    }

    fn job(dir: &Path) -> CompileJob {
        let src = dir.join("a.js");
        fs::write(&src, "window.a = function () { return 1; };").unwrap();
        CompileJob::new(vec![src], dir.join("min/a-00.js"), BTreeMap::new())
    }

    #[test]
    fn test_temporary_publish_writes_artifact_then_stages() {
        let dir = TempDir::new().unwrap();
        let queue = DirQueue::new(dir.path().join("staging"));
        let job = job(dir.path());
        let dest = job.destination.clone();

        let temporary = Publisher::new(&queue, true)
            .publish(AssetKind::Script, job)
            .unwrap();

        assert!(temporary);
        assert!(fs::read_to_string(&dest).unwrap().contains("window.a"));
        assert!(temp_flag(&dest).exists());
        assert_eq!(queue.pending().len(), 1);
    }

    #[test]
    fn test_final_only_publish_just_stages() {
        let dir = TempDir::new().unwrap();
        let queue = DirQueue::new(dir.path().join("staging"));
        let job = job(dir.path());
        let dest = job.destination.clone();

        let temporary = Publisher::new(&queue, false)
            .publish(AssetKind::Script, job)
            .unwrap();

        assert!(!temporary);
        assert!(!dest.exists());
        assert_eq!(queue.pending().len(), 1);
    }

    #[test]
    fn test_stage_failure_keeps_fallback() {
        let dir = TempDir::new().unwrap();
        let job = job(dir.path());
        let dest = job.destination.clone();

        let err = Publisher::new(&ClosedQueue, true)
            .publish(AssetKind::Script, job)
            .unwrap_err();

        assert!(matches!(err, PublishError::Stage(..)));
        assert!(dest.exists());
        assert!(temp_flag(&dest).exists());
    }

    #[test]
    fn test_missing_source_is_write_failure() {
        let dir = TempDir::new().unwrap();
        let mut job = job(dir.path());
        job.sources = vec![dir.path().join("gone.js")];
        let queue = DirQueue::new(dir.path().join("staging"));

        let err = Publisher::new(&queue, true)
            .publish(AssetKind::Script, job)
            .unwrap_err();
        assert!(matches!(err, PublishError::Write(..)));
        // nothing staged after a failed fallback
        assert!(queue.pending().is_empty());
    }
}
