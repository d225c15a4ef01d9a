//! Scheduler trait: submit a command, list job states, cancel a job.

use async_trait::async_trait;
use std::path::PathBuf;

/// Identifier the scheduler assigns to a submitted job.
pub type ExternalJobId = u64;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("`{command}` failed (exit {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("unexpected scheduler output: {0}")]
    UnexpectedOutput(String),
    #[error("unhandled value {0:?} for job status")]
    UnknownStatus(String),
    #[error("scheduler io: {0}")]
    Io(#[from] std::io::Error),
}

/// One submission: the command arguments plus where the scheduler writes the job's
/// standard output and error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub args: Vec<String>,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

/// One row of the scheduler's status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub id: ExternalJobId,
    pub code: String,
}

/// Batch scheduler reachable through blocking round trips.
///
/// Contract: `list_status` only reports jobs the scheduler still tracks; finished jobs
/// disappear from the report. Calls have no timeout.
#[async_trait]
pub trait BatchScheduler: Send + Sync {
    /// Submit a job; returns the id parsed from the scheduler's acknowledgement.
    async fn submit(&self, req: &SubmitRequest) -> Result<ExternalJobId, SchedulerError>;

    /// Current status report.
    async fn list_status(&self) -> Result<Vec<StatusEntry>, SchedulerError>;

    /// Ask the scheduler to cancel a job.
    async fn cancel(&self, id: ExternalJobId) -> Result<(), SchedulerError>;
}
