//! The process handler contract.

use crate::{Submission, WorkingDir};
use async_trait::async_trait;
use job_media::{choose, MediaError};
use job_scheduler::SchedulerError;
use job_types::{JobStatus, Representation, Summary, APPLICATION_JSON, TEXT_PLAIN};

/// Why a handler refused a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("submission rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("scheduler: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("missing artifact {0:?}")]
    MissingArtifact(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// True when the failure is a file that vanished from the working directory.
    pub fn is_missing_file(&self) -> bool {
        match self {
            HandlerError::MissingArtifact(_) => true,
            HandlerError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Logic bound to one process name.
///
/// A handler holds no per-job state; every job operation receives the job's working
/// directory. Optional operations have default implementations: `validate` accepts
/// everything, `info` reports only the status, `subpart` knows no names and `delete`
/// has nothing to release.
#[async_trait]
pub trait ProcessHandler: Send + Sync {
    /// One line description for the process listing.
    fn description(&self) -> &str;

    /// Negotiated documentation for the process.
    fn document(&self, accept: Option<&str>) -> Result<Representation, HandlerError>;

    /// Inspect a staged submission before anything is launched. A rejection leaves
    /// nothing behind except the working directory, which the caller discards.
    async fn validate(
        &self,
        _dir: &WorkingDir,
        _submission: &Submission,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Start the work. Once this returns `Ok` the job is submitted.
    async fn launch(&self, dir: &WorkingDir) -> Result<(), HandlerError>;

    async fn status(&self, dir: &WorkingDir) -> Result<JobStatus, HandlerError>;

    /// Negotiated status summary for `GET /job/<id>`.
    async fn info(
        &self,
        accept: Option<&str>,
        dir: &WorkingDir,
    ) -> Result<Representation, HandlerError> {
        let status = self.status(dir).await?;
        let media_type = choose(accept, &[TEXT_PLAIN, APPLICATION_JSON])?;
        Ok(Summary::new()
            .field("job_status", status.as_str())
            .render(media_type))
    }

    /// Named artifact of a job, e.g. a captured output stream.
    async fn subpart(
        &self,
        _accept: Option<&str>,
        _dir: &WorkingDir,
        _name: &str,
    ) -> Result<Representation, HandlerError> {
        Err(HandlerError::NotFound)
    }

    /// Release external resources. Called while the working directory still exists.
    async fn delete(&self, _dir: &WorkingDir) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Static documentation of a process.
#[derive(Debug, Clone)]
pub struct Documentation {
    pub description: String,
    pub input: String,
    pub outputs: Vec<String>,
}

/// Render documentation as text/plain or JSON, whichever the client prefers.
pub fn document(accept: Option<&str>, doc: &Documentation) -> Result<Representation, HandlerError> {
    let media_type = choose(accept, &[TEXT_PLAIN, APPLICATION_JSON])?;
    if media_type == APPLICATION_JSON {
        return Ok(Representation::json(&serde_json::json!({
            "description": doc.description,
            "input": doc.input,
            "outputs": doc.outputs,
        })));
    }
    Ok(Representation::text(format!(
        "{}\n\ninput: {}\noutputs: {}\n",
        doc.description,
        doc.input,
        doc.outputs.join(", ")
    )))
}
