//! Grid Engine backend: runs `qsub`, `qstat` and `qdel` as child processes.

use crate::report::{parse_status_listing, parse_submit_ack};
use crate::{BatchScheduler, ExternalJobId, SchedulerError, StatusEntry, SubmitRequest};
use async_trait::async_trait;
use std::ffi::OsString;

/// Command names and submission shell for the Grid Engine tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgeConfig {
    pub qsub: String,
    pub qstat: String,
    pub qdel: String,
    /// Shell passed to `qsub -S`.
    pub shell: String,
}

impl Default for SgeConfig {
    fn default() -> Self {
        Self {
            qsub: "qsub".to_string(),
            qstat: "qstat".to_string(),
            qdel: "qdel".to_string(),
            shell: "/bin/bash".to_string(),
        }
    }
}

impl SgeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            qsub: std::env::var("JOBGATE_QSUB").unwrap_or(defaults.qsub),
            qstat: std::env::var("JOBGATE_QSTAT").unwrap_or(defaults.qstat),
            qdel: std::env::var("JOBGATE_QDEL").unwrap_or(defaults.qdel),
            shell: std::env::var("JOBGATE_SHELL").unwrap_or(defaults.shell),
        }
    }
}

/// BatchScheduler backed by the Grid Engine command line tools.
pub struct SgeScheduler {
    config: SgeConfig,
}

impl SgeScheduler {
    pub fn new(config: SgeConfig) -> Self {
        Self { config }
    }

    fn submit_args(&self, req: &SubmitRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-S".into(),
            self.config.shell.clone().into(),
            "-o".into(),
            req.stdout.clone().into_os_string(),
            "-e".into(),
            req.stderr.clone().into_os_string(),
        ];
        args.extend(req.args.iter().map(OsString::from));
        args
    }
}

/// Run a command to completion and return its stdout; a non-zero exit is an error.
///
/// With `kill_on_drop` the child dies with a dropped caller. Submissions must not use
/// it: a killed `qsub` may already have queued the job.
async fn run(
    program: &str,
    args: &[OsString],
    kill_on_drop: bool,
) -> Result<String, SchedulerError> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(kill_on_drop)
        .output()
        .await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(SchedulerError::CommandFailed {
            command: program.to_string(),
            code: output.status.code(),
            stderr,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl BatchScheduler for SgeScheduler {
    async fn submit(&self, req: &SubmitRequest) -> Result<ExternalJobId, SchedulerError> {
        let ack = run(&self.config.qsub, &self.submit_args(req), false).await?;
        let id = parse_submit_ack(&ack)?;
        tracing::info!(external_id = id, args = ?req.args, "job submitted to scheduler");
        Ok(id)
    }

    async fn list_status(&self) -> Result<Vec<StatusEntry>, SchedulerError> {
        let report = run(&self.config.qstat, &[], true).await?;
        parse_status_listing(&report)
    }

    async fn cancel(&self, id: ExternalJobId) -> Result<(), SchedulerError> {
        run(&self.config.qdel, &[id.to_string().into()], true).await?;
        tracing::info!(external_id = id, "scheduler job cancelled");
        Ok(())
    }
}
