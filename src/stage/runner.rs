//! Runs staged compile jobs.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CompileJob, StageError};
use crate::cache::temp_flag;
use crate::config::PipelineConfig;
use crate::minify::minify_files;
use crate::registry::AssetKind;
use crate::utils::exec::Cmd;

/// Executes [`CompileJob`]s with the configured compiler, or the built-in
/// minifier when none is set.
///
/// The result is written next to the destination and renamed over it, then
/// the temporary flag is removed. A failed job leaves the temporary
/// artifact and its flag in place.
#[derive(Debug, Clone, Default)]
pub struct JobRunner {
    compiler: Vec<String>,
    cwd: Option<PathBuf>,
}

impl JobRunner {
    pub fn new(compiler: Vec<String>) -> Self {
        Self {
            compiler,
            cwd: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut runner = Self::new(config.js.compiler.clone());
        if !config.root.as_os_str().is_empty() {
            runner.cwd = Some(config.root.clone());
        }
        runner
    }

    pub fn run(&self, job: &CompileJob) -> Result<(), StageError> {
        let part = self.build(job)?;
        self.publish(job, &part)
    }

    /// Compile `job` into its `.part` file without touching the destination.
    pub fn build(&self, job: &CompileJob) -> Result<PathBuf, StageError> {
        if let Some(missing) = job.sources.iter().find(|src| !src.exists()) {
            return Err(StageError::MissingSource(missing.clone()));
        }

        let part = part_path(&job.destination);
        let built = if self.compiler.is_empty() {
            self.build_in_process(job, &part)
        } else {
            self.build_external(job, &part)
        };
        if let Err(e) = built {
            let _ = fs::remove_file(&part);
            return Err(e);
        }
        Ok(part)
    }

    /// Move a finished build over the destination and clear the flag.
    pub fn publish(&self, job: &CompileJob, part: &Path) -> Result<(), StageError> {
        fs::rename(part, &job.destination)
            .map_err(|e| StageError::Io(job.destination.clone(), e))?;

        // Final artifact is in place before the flag goes
        match fs::remove_file(temp_flag(&job.destination)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                crate::log!("warning"; "couldn't clear temporary flag for {}: {}", job.name(), e);
            }
            _ => {}
        }
        crate::debug!("stage"; "built {}", job.destination.display());
        Ok(())
    }

    fn build_external(&self, job: &CompileJob, part: &Path) -> Result<(), StageError> {
        let mut cmd = Cmd::from_slice(&self.compiler);
        for source in &job.sources {
            cmd = cmd.arg("--js").arg(source);
        }
        cmd = cmd.arg("--js_output_file").arg(part);
        for (key, value) in &job.options {
            cmd = cmd.arg(format!("--{key}")).arg(value);
        }
        if let Some(cwd) = &self.cwd {
            cmd = cmd.cwd(cwd);
        }
        cmd.run().map_err(StageError::Compile)?;

        if !part.exists() {
            return Err(StageError::Compile(anyhow::anyhow!(
                "compiler produced no output for `{}`",
                job.name()
            )));
        }
        Ok(())
    }

    fn build_in_process(&self, job: &CompileJob, part: &Path) -> Result<(), StageError> {
        let kind = AssetKind::from_path(&job.name()).unwrap_or(AssetKind::Script);
        let code = minify_files(kind, &job.sources)
            .map_err(|e| StageError::Io(job.destination.clone(), e))?;
        fs::write(part, code).map_err(|e| StageError::Io(part.to_path_buf(), e))
    }
}

/// `a-1f.js` → `a-1f.js.part`
fn part_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
