//! Staging directory queue.
//!
//! Each job is one JSON file named after its destination
//! (`imageFill-1f2e.js.json`). Staging the same destination again replaces
//! the pending job. `respipe worker` drains the directory.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::{CompileJob, JobHandle, JobQueue, JobRunner, StageError};

const JOB_EXT: &str = "json";
const RUNNING_EXT: &str = "running";
const FAILED_EXT: &str = "failed";

#[derive(Debug, Clone)]
pub struct DirQueue {
    dir: PathBuf,
}

/// Outcome of one [`DirQueue::drain`] pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub built: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.built.is_empty() && self.failed.is_empty()
    }
}

impl DirQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Job files waiting to run, oldest name first.
    pub fn pending(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut jobs: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == JOB_EXT))
            .collect();
        jobs.sort();
        jobs
    }

    /// Run every pending job in parallel.
    ///
    /// Finished job files are removed; failed ones are renamed to
    /// `*.failed` so a watching runner doesn't retry them forever.
    pub fn drain(&self, runner: &JobRunner) -> DrainReport {
        let results: Vec<_> = self
            .pending()
            .into_par_iter()
            .filter_map(|file| self.run_file(&file, runner))
            .collect();

        let mut report = DrainReport::default();
        for result in results {
            match result {
                Ok(destination) => report.built.push(destination),
                Err(failure) => report.failed.push(failure),
            }
        }
        report
    }

    /// Claim, parse and run one job file.
    ///
    /// Returns `None` when another runner claimed the file first.
    fn run_file(&self, file: &Path, runner: &JobRunner) -> Option<Result<PathBuf, (PathBuf, String)>> {
        let claimed = file.with_extension(RUNNING_EXT);
        // A re-staged job can land at `file` while this one runs
        fs::rename(file, &claimed).ok()?;

        let outcome = fs::read_to_string(&claimed)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                serde_json::from_str::<CompileJob>(&json).map_err(|e| format!("bad job file: {e}"))
            })
            .and_then(|job| {
                let part = runner.build(&job).map_err(|e| e.to_string())?;
                if file.exists() {
                    // superseded by a newer job for the same artifact
                    let _ = fs::remove_file(&part);
                    crate::debug!("stage"; "{} restaged while building, skipped", job.name());
                    return Ok(job.destination);
                }
                runner
                    .publish(&job, &part)
                    .map(|()| job.destination.clone())
                    .map_err(|e| e.to_string())
            });

        match outcome {
            Ok(destination) => {
                let _ = fs::remove_file(&claimed);
                Some(Ok(destination))
            }
            Err(message) => {
                let _ = fs::rename(&claimed, file.with_extension(FAILED_EXT));
                Some(Err((file.to_path_buf(), message)))
            }
        }
    }
}

impl JobQueue for DirQueue {
    fn stage(&self, job: CompileJob) -> Result<JobHandle, StageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StageError::Io(self.dir.clone(), e))?;

        let name = job.name();
        let path = self.dir.join(format!("{name}.{JOB_EXT}"));
        let tmp = self.dir.join(format!("{name}.{}.tmp", std::process::id()));
        let json = serde_json::to_string_pretty(&job)?;

        fs::write(&tmp, json).map_err(|e| StageError::Io(tmp.clone(), e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StageError::Io(path.clone(), e)
        })?;

        crate::debug!("stage"; "queued {}", name);
        Ok(JobHandle::File(path))
    }
}
