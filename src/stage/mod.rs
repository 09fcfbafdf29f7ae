//! Staging of authoritative builds.
//!
//! Resolution never waits for the slow compiler. It hands a [`CompileJob`]
//! to a [`JobQueue`] and returns whatever is on disk now; the job runs
//! later and swaps the final artifact in.
//!
//! ```text
//! Resolver ──stage()──► DirQueue ──job file──► `respipe worker` ─┐
//!                   └─► WorkerQueue ──channel──► worker threads ─┴─► JobRunner
//! ```

mod dir;
mod runner;
mod worker;

pub use dir::{DirQueue, DrainReport};
pub use runner::JobRunner;
pub use worker::WorkerQueue;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{PipelineConfig, StageMode};

/// One authoritative build: compile `sources` (in order) into `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileJob {
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    /// Compiler options, passed as `--key value`
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl CompileJob {
    pub fn new(
        sources: Vec<PathBuf>,
        destination: impl Into<PathBuf>,
        options: BTreeMap<String, String>,
    ) -> Self {
        Self {
            sources,
            destination: destination.into(),
            options,
        }
    }

    /// File name of the destination, used to name job files.
    pub fn name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Receipt for a staged job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobHandle {
    /// Job file written to the staging directory.
    File(PathBuf),
    /// Sent to a worker thread.
    Sent,
    /// A job for the same destination is already in flight.
    Coalesced,
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("couldn't write job file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("couldn't encode job")]
    Encode(#[from] serde_json::Error),

    #[error("worker pool has shut down")]
    Closed,

    #[error("missing source `{0}`")]
    MissingSource(PathBuf),

    #[error("{0:#}")]
    Compile(anyhow::Error),
}

/// Hand-off point for authoritative builds. `stage` must not block on the
/// build itself.
pub trait JobQueue: Send + Sync + std::fmt::Debug {
    fn stage(&self, job: CompileJob) -> Result<JobHandle, StageError>;
}

/// Queue selected by `[js.stage]`.
pub fn queue_for(config: &PipelineConfig) -> Arc<dyn JobQueue> {
    let stage = &config.js.stage;
    match stage.mode {
        StageMode::Directory => Arc::new(DirQueue::new(&stage.dir)),
        StageMode::Worker => Arc::new(WorkerQueue::start(
            stage.workers,
            JobRunner::from_config(config),
        )),
    }
}
