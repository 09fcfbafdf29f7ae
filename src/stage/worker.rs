//! In-process worker pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

use super::{CompileJob, JobHandle, JobQueue, JobRunner, StageError};

/// Destination → job to run once the current build finishes.
type InFlight = DashMap<PathBuf, Option<CompileJob>>;

/// Jobs go over a channel to `workers` threads.
///
/// Destinations in flight are tracked so a second request for the same
/// artifact doesn't run a concurrent build. It is kept as a rerun instead:
/// the running build is discarded and the newest job runs in its place.
#[derive(Debug)]
pub struct WorkerQueue {
    tx: Mutex<Option<Sender<CompileJob>>>,
    in_flight: Arc<InFlight>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerQueue {
    /// Spawn the pool. `workers` is clamped to at least one.
    pub fn start(workers: usize, runner: JobRunner) -> Self {
        let (tx, rx) = channel::unbounded::<CompileJob>();
        let in_flight = Arc::new(DashMap::new());
        let runner = Arc::new(runner);

        let handles = (0..workers.max(1))
            .map(|_| {
                let rx = rx.clone();
                let runner = Arc::clone(&runner);
                let in_flight = Arc::clone(&in_flight);
                std::thread::spawn(move || {
                    while let Ok(job) = rx.recv() {
                        run_until_settled(&runner, &in_flight, job);
                    }
                })
            })
            .collect();

        Self {
            tx: Mutex::new(Some(tx)),
            in_flight,
            workers: Mutex::new(handles),
        }
    }

    /// Number of jobs staged but not finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Block until every staged job has finished.
    pub fn wait_idle(&self) {
        while !self.in_flight.is_empty() {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Stop accepting jobs, finish the queued ones and join the threads.
    pub fn shutdown(&self) {
        self.tx.lock().take();
        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }
    }
}

impl JobQueue for WorkerQueue {
    fn stage(&self, job: CompileJob) -> Result<JobHandle, StageError> {
        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(StageError::Closed)?;

        match self.in_flight.entry(job.destination.clone()) {
            Entry::Occupied(mut running) => {
                running.insert(Some(job));
                return Ok(JobHandle::Coalesced);
            }
            Entry::Vacant(slot) => {
                slot.insert(None);
            }
        }

        let destination = job.destination.clone();
        if tx.send(job).is_err() {
            self.in_flight.remove(&destination);
            return Err(StageError::Closed);
        }
        Ok(JobHandle::Sent)
    }
}

/// Run `job`, then any reruns staged for its destination meanwhile.
///
/// A build is only published while no rerun is pending; the entry lock is
/// held across the publish so a new stage can't slip in between.
fn run_until_settled(runner: &JobRunner, in_flight: &InFlight, mut job: CompileJob) {
    loop {
        let built = runner.build(&job);

        let Entry::Occupied(mut entry) = in_flight.entry(job.destination.clone()) else {
            return;
        };
        if let Some(next) = entry.get_mut().take() {
            if let Ok(part) = built {
                let _ = std::fs::remove_file(part);
            }
            crate::debug!("stage"; "{} changed while building, rebuilding", next.name());
            job = next;
            continue;
        }

        if let Err(e) = built.and_then(|part| runner.publish(&job, &part)) {
            crate::log!("error"; "{}: {}", job.name(), e);
        }
        entry.remove();
        return;
    }
}

impl Drop for WorkerQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::temp_flag;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_worker_builds_staged_job() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.js");
        let dest = dir.path().join("a-00.js");
        fs::write(&src, "window.a = function () { return 1; };").unwrap();
        fs::write(&dest, "temporary").unwrap();
        fs::write(temp_flag(&dest), "temporary flag").unwrap();

        let queue = WorkerQueue::start(2, JobRunner::default());
        let handle = queue
            .stage(CompileJob::new(vec![src], &dest, BTreeMap::new()))
            .unwrap();
        assert_eq!(handle, JobHandle::Sent);

        queue.wait_idle();
        assert!(!temp_flag(&dest).exists());
        assert_ne!(fs::read_to_string(&dest).unwrap(), "temporary");
    }

    #[test]
    fn test_duplicate_destination_is_coalesced() {
        let queue = WorkerQueue::start(1, JobRunner::default());
        // hold the destination as if a job were running
        queue.in_flight.insert(PathBuf::from("/www/js/min/a.js"), None);

        let job = CompileJob::new(vec![], "/www/js/min/a.js", BTreeMap::new());
        assert_eq!(queue.stage(job.clone()).unwrap(), JobHandle::Coalesced);
        assert_eq!(queue.in_flight(), 1);
        assert_eq!(
            queue.in_flight.get(&job.destination).unwrap().value().clone(),
            Some(job)
        );
    }

    #[test]
    fn test_restage_while_running_publishes_newest_build() {
        let dir = TempDir::new().unwrap();
        let old_src = dir.path().join("old.js");
        let new_src = dir.path().join("new.js");
        let dest = dir.path().join("a-00.js");
        fs::write(&old_src, "window.a = 'OLD';").unwrap();
        fs::write(&new_src, "window.a = 'NEW';").unwrap();
        // fallback for the newer edit
        fs::write(&dest, "window.a='NEW'").unwrap();
        fs::write(temp_flag(&dest), "temporary flag").unwrap();

        let queue = WorkerQueue::start(1, JobRunner::default());
        let running = CompileJob::new(vec![old_src], &dest, BTreeMap::new());
        queue.in_flight.insert(dest.clone(), None);

        let newer = CompileJob::new(vec![new_src], &dest, BTreeMap::new());
        assert_eq!(queue.stage(newer).unwrap(), JobHandle::Coalesced);

        // the running worker reaches the end of its build
        run_until_settled(&JobRunner::default(), &queue.in_flight, running);

        let out = fs::read_to_string(&dest).unwrap();
        assert!(out.contains("NEW"), "{out}");
        assert!(!out.contains("OLD"));
        assert!(!temp_flag(&dest).exists());
        assert_eq!(queue.in_flight(), 0);
    }

    #[test]
    fn test_stage_after_shutdown_fails() {
        let queue = WorkerQueue::start(1, JobRunner::default());
        queue.shutdown();
        let job = CompileJob::new(vec![], "/www/js/min/a.js", BTreeMap::new());
        assert!(matches!(queue.stage(job), Err(StageError::Closed)));
    }
}
