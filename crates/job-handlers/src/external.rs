//! Reusable scheduler plumbing for handlers whose work runs on the batch scheduler.
//!
//! State is never stored: every `status` call re-reads the scheduler's report. A job
//! missing from the report is `completed`, because the scheduler forgets finished jobs.

use crate::{HandlerError, WorkingDir};
use job_media::choose;
use job_scheduler::{status_from_code, BatchScheduler, ExternalJobId, SubmitRequest};
use job_types::{JobStatus, Representation, Summary, APPLICATION_JSON, TEXT_PLAIN};
use std::sync::Arc;

const JOB_ID: &str = "job_id";
const STDOUT: &str = "stdout";
const STDERR: &str = "stderr";

/// Scheduler helper composed into scheduler-backed handlers.
#[derive(Clone)]
pub struct ExternalJob {
    scheduler: Arc<dyn BatchScheduler>,
}

impl ExternalJob {
    pub fn new(scheduler: Arc<dyn BatchScheduler>) -> Self {
        Self { scheduler }
    }

    /// Submit `args` with stdout/stderr captured in the working directory, then persist
    /// the scheduler's id there before returning.
    pub async fn submit(
        &self,
        dir: &WorkingDir,
        args: Vec<String>,
    ) -> Result<ExternalJobId, HandlerError> {
        let req = SubmitRequest {
            args,
            stdout: dir.file(STDOUT),
            stderr: dir.file(STDERR),
        };
        let id = self.scheduler.submit(&req).await?;
        dir.write(JOB_ID, format!("{}\n", id).as_bytes()).await?;
        tracing::info!(job_id = %dir.id(), external_id = id, "scheduler job recorded");
        Ok(id)
    }

    /// The scheduler id recorded at launch.
    pub async fn job_id(&self, dir: &WorkingDir) -> Result<ExternalJobId, HandlerError> {
        let raw = dir
            .read_optional(JOB_ID)
            .await?
            .ok_or_else(|| HandlerError::MissingArtifact(JOB_ID.to_string()))?;
        String::from_utf8_lossy(&raw)
            .trim()
            .parse()
            .map_err(|_| HandlerError::MissingArtifact(JOB_ID.to_string()))
    }

    pub async fn status(&self, dir: &WorkingDir) -> Result<JobStatus, HandlerError> {
        let id = self.job_id(dir).await?;
        self.status_of(id).await
    }

    async fn status_of(&self, id: ExternalJobId) -> Result<JobStatus, HandlerError> {
        let listing = self.scheduler.list_status().await?;
        match listing.iter().find(|entry| entry.id == id) {
            None => Ok(JobStatus::Completed),
            Some(entry) => Ok(status_from_code(&entry.code)?),
        }
    }

    /// Summary with the scheduler id, status and, once output exists, the names of the
    /// output sub-resources.
    pub async fn info(
        &self,
        accept: Option<&str>,
        dir: &WorkingDir,
    ) -> Result<Representation, HandlerError> {
        let media_type = choose(accept, &[TEXT_PLAIN, APPLICATION_JSON])?;
        let id = self.job_id(dir).await?;
        let status = self.status_of(id).await?;
        let mut summary = Summary::new()
            .field("job_id", id)
            .field("job_status", status.as_str());
        if status.has_output() {
            summary = summary.field(STDOUT, STDOUT).field(STDERR, STDERR);
        }
        Ok(summary.render(media_type))
    }

    /// `stdout` / `stderr`, available once the job has left the queue without error.
    /// A stream the scheduler has not written yet reads as empty.
    pub async fn subpart(
        &self,
        accept: Option<&str>,
        dir: &WorkingDir,
        name: &str,
    ) -> Result<Representation, HandlerError> {
        if name != STDOUT && name != STDERR {
            return Err(HandlerError::NotFound);
        }
        if !self.status(dir).await?.has_output() {
            return Err(HandlerError::NotFound);
        }
        let media_type = choose(accept, &[TEXT_PLAIN])?;
        let body = dir.read_optional(name).await?.unwrap_or_default();
        Ok(Representation::new(media_type, body))
    }

    /// Best-effort cancellation; failures are logged, never returned.
    pub async fn cancel(&self, dir: &WorkingDir) {
        let id = match self.job_id(dir).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(job_id = %dir.id(), error = %e, "no scheduler id to cancel");
                return;
            }
        };
        if let Err(e) = self.scheduler.cancel(id).await {
            tracing::warn!(job_id = %dir.id(), external_id = id, error = %e, "scheduler cancel failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_media::MediaError;
    use job_scheduler::{FakeScheduler, SchedulerError};

    async fn submitted(base: &std::path::Path) -> (Arc<FakeScheduler>, ExternalJob, WorkingDir) {
        let fake = Arc::new(FakeScheduler::new());
        let external = ExternalJob::new(fake.clone());
        let dir = WorkingDir::allocate(base).await.unwrap();
        external
            .submit(&dir, vec!["run.sh".to_string()])
            .await
            .unwrap();
        (fake, external, dir)
    }

    #[tokio::test]
    async fn submit_persists_scheduler_id() {
        let base = tempfile::tempdir().unwrap();
        let (fake, external, dir) = submitted(base.path()).await;
        let id = fake.last_submitted().unwrap();
        assert_eq!(external.job_id(&dir).await.unwrap(), id);

        let (_, req) = &fake.submitted()[0];
        assert_eq!(req.stdout, dir.file("stdout"));
        assert_eq!(req.stderr, dir.file("stderr"));
    }

    #[tokio::test]
    async fn status_follows_the_report() {
        let base = tempfile::tempdir().unwrap();
        let (fake, external, dir) = submitted(base.path()).await;
        let id = fake.last_submitted().unwrap();

        assert_eq!(external.status(&dir).await.unwrap(), JobStatus::Queued);
        fake.set_code(id, "r");
        assert_eq!(external.status(&dir).await.unwrap(), JobStatus::Running);
        fake.set_code(id, "Eqw");
        assert_eq!(external.status(&dir).await.unwrap(), JobStatus::Error);
        fake.finish(id, "", "").unwrap();
        assert_eq!(external.status(&dir).await.unwrap(), JobStatus::Completed);
        assert_eq!(external.status(&dir).await.unwrap(), JobStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_code_is_an_internal_error() {
        let base = tempfile::tempdir().unwrap();
        let (fake, external, dir) = submitted(base.path()).await;
        fake.set_code(fake.last_submitted().unwrap(), "zz");
        assert!(matches!(
            external.status(&dir).await,
            Err(HandlerError::Scheduler(SchedulerError::UnknownStatus(_)))
        ));
    }

    #[tokio::test]
    async fn output_streams_wait_for_the_queue() {
        let base = tempfile::tempdir().unwrap();
        let (fake, external, dir) = submitted(base.path()).await;
        let id = fake.last_submitted().unwrap();

        assert!(matches!(
            external.subpart(None, &dir, "stdout").await,
            Err(HandlerError::NotFound)
        ));
        let info = external.info(None, &dir).await.unwrap();
        assert_eq!(
            String::from_utf8(info.body).unwrap(),
            format!("job_id: {}\njob_status: queued\n", id)
        );

        fake.set_code(id, "r");
        let out = external.subpart(None, &dir, "stdout").await.unwrap();
        assert_eq!(out.media_type, TEXT_PLAIN);
        assert!(out.body.is_empty());

        fake.finish(id, "3 12 80\n", "").unwrap();
        let out = external.subpart(Some("text/*"), &dir, "stdout").await.unwrap();
        assert_eq!(out.body, b"3 12 80\n");
        assert!(matches!(
            external.subpart(Some("application/json"), &dir, "stderr").await,
            Err(HandlerError::Media(MediaError::NotAcceptable))
        ));
        assert!(matches!(
            external.subpart(None, &dir, "data").await,
            Err(HandlerError::NotFound)
        ));

        let info = external.info(Some("application/json"), &dir).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&info.body).unwrap();
        assert_eq!(v["job_status"], "completed");
        assert_eq!(v["stdout"], "stdout");
    }

    #[tokio::test]
    async fn cancel_is_best_effort() {
        let base = tempfile::tempdir().unwrap();
        let (fake, external, dir) = submitted(base.path()).await;
        external.cancel(&dir).await;
        assert_eq!(fake.cancelled(), vec![fake.last_submitted().unwrap()]);

        let empty = WorkingDir::allocate(base.path()).await.unwrap();
        external.cancel(&empty).await;
        assert_eq!(fake.cancelled().len(), 1);
    }
}
