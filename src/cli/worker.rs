//! `respipe worker`: run staged compiler jobs.
//!
//! Without `--watch` the staging directory is drained once. With it, the
//! directory is watched and drained again whenever a job file lands.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{EventKind, RecursiveMode, Watcher};
use respipe::config::StageMode;
use respipe::logger::WatchStatus;
use respipe::stage::{DirQueue, DrainReport, JobRunner};
use respipe::{PipelineConfig, log};

/// Quiet period before draining after a burst of events.
const SETTLE: Duration = Duration::from_millis(200);

pub fn run_worker(config: &PipelineConfig, watch: bool) -> Result<()> {
    if config.js.stage.mode == StageMode::Worker {
        log!("worker"; "js.stage.mode is `worker`; jobs run inside resolving processes");
    }

    let queue = DirQueue::new(&config.js.stage.dir);
    let runner = JobRunner::from_config(config);

    if !watch {
        let report = queue.drain(&runner);
        print_report(&report);
        if !report.failed.is_empty() {
            anyhow::bail!("{} job(s) failed", report.failed.len());
        }
        return Ok(());
    }

    watch_queue(&queue, &runner)
}

fn watch_queue(queue: &DirQueue, runner: &JobRunner) -> Result<()> {
    let dir = queue.dir();
    std::fs::create_dir_all(dir).with_context(|| format!("couldn't create `{}`", dir.display()))?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    let mut status = WatchStatus::new();
    status.idle(&format!("watching {}", dir.display()));
    drain_with_status(queue, runner, &mut status);

    for res in &rx {
        match res {
            Ok(event) if is_new_job(&event) => {}
            Ok(_) => continue,
            Err(e) => {
                status.error("watch error", &e.to_string());
                continue;
            }
        }
        // Coalesce the burst a single resolution produces.
        while rx.recv_timeout(SETTLE).is_ok() {}
        drain_with_status(queue, runner, &mut status);
    }
    Ok(())
}

fn is_new_job(event: &notify::Event) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|p| is_job_file(p))
}

fn is_job_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn drain_with_status(queue: &DirQueue, runner: &JobRunner, status: &mut WatchStatus) {
    let report = queue.drain(runner);
    if report.is_empty() {
        return;
    }
    if let Some((job, message)) = report.failed.first() {
        let summary = format!("{} built, {} failed: {}", report.built.len(), report.failed.len(), job.display());
        status.error(&summary, message);
    } else {
        status.success(&format!("built {}", names(&report)));
    }
}

fn print_report(report: &DrainReport) {
    if report.is_empty() {
        log!("worker"; "nothing staged");
        return;
    }
    for destination in &report.built {
        log!("worker"; "built {}", destination.display());
    }
    for (job, message) in &report.failed {
        log!("error"; "{}: {}", job.display(), message);
    }
}

fn names(report: &DrainReport) -> String {
    report
        .built
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy())
        .collect::<Vec<_>>()
        .join(", ")
}
