//! Word count over a URL, run on the batch scheduler.

use crate::{
    document, Documentation, ExternalJob, HandlerError, ProcessHandler, Rejection, Submission,
    WorkingDir,
};
use async_trait::async_trait;
use job_scheduler::BatchScheduler;
use job_types::{JobStatus, Representation, TEXT_PLAIN};
use std::sync::Arc;

const DESCRIPTION: &str = "word count (wc)";
const DEFAULT_SCRIPT: &str = "wc.sge";

/// Submits `<script> <url>` where the URL is the posted text/plain body.
pub struct WordCountHandler {
    script: String,
    external: ExternalJob,
}

impl WordCountHandler {
    pub fn new(scheduler: Arc<dyn BatchScheduler>, script: Option<&str>) -> Self {
        Self {
            script: script.unwrap_or(DEFAULT_SCRIPT).to_string(),
            external: ExternalJob::new(scheduler),
        }
    }
}

#[async_trait]
impl ProcessHandler for WordCountHandler {
    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn document(&self, accept: Option<&str>) -> Result<Representation, HandlerError> {
        document(
            accept,
            &Documentation {
                description: DESCRIPTION.to_string(),
                input: "text/plain body holding an http:// URL".to_string(),
                outputs: vec!["stdout".to_string(), "stderr".to_string()],
            },
        )
    }

    async fn validate(
        &self,
        _dir: &WorkingDir,
        submission: &Submission,
    ) -> Result<(), HandlerError> {
        if submission.content_type != TEXT_PLAIN {
            return Err(Rejection::UnsupportedMediaType.into());
        }
        if !submission.data.starts_with(b"http://") {
            return Err(Rejection::BadRequest("data must contain a URL\n".to_string()).into());
        }
        Ok(())
    }

    async fn launch(&self, dir: &WorkingDir) -> Result<(), HandlerError> {
        let data = dir.data().await?;
        let url = String::from_utf8_lossy(&data).trim().to_string();
        self.external
            .submit(dir, vec![self.script.clone(), url])
            .await?;
        Ok(())
    }

    async fn status(&self, dir: &WorkingDir) -> Result<JobStatus, HandlerError> {
        self.external.status(dir).await
    }

    async fn info(
        &self,
        accept: Option<&str>,
        dir: &WorkingDir,
    ) -> Result<Representation, HandlerError> {
        self.external.info(accept, dir).await
    }

    async fn subpart(
        &self,
        accept: Option<&str>,
        dir: &WorkingDir,
        name: &str,
    ) -> Result<Representation, HandlerError> {
        self.external.subpart(accept, dir, name).await
    }

    async fn delete(&self, dir: &WorkingDir) -> Result<(), HandlerError> {
        self.external.cancel(dir).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_scheduler::FakeScheduler;

    fn submission(data: &str, content_type: &str) -> Submission {
        Submission {
            data: data.as_bytes().to_vec(),
            content_type: content_type.to_string(),
        }
    }

    #[tokio::test]
    async fn validation_rules() {
        let base = tempfile::tempdir().unwrap();
        let dir = WorkingDir::allocate(base.path()).await.unwrap();
        let handler = WordCountHandler::new(Arc::new(FakeScheduler::new()), None);

        handler
            .validate(&dir, &submission("http://example.org/data", "text/plain"))
            .await
            .unwrap();
        assert!(matches!(
            handler
                .validate(&dir, &submission("http://example.org/data", "text/json"))
                .await,
            Err(HandlerError::Rejected(Rejection::UnsupportedMediaType))
        ));
        assert!(matches!(
            handler
                .validate(&dir, &submission("ftp://example.org/data", "text/plain"))
                .await,
            Err(HandlerError::Rejected(Rejection::BadRequest(_)))
        ));
    }

    #[tokio::test]
    async fn launch_submits_script_and_url() {
        let base = tempfile::tempdir().unwrap();
        let dir = WorkingDir::allocate(base.path()).await.unwrap();
        let sub = submission("http://example.org/data\n", "text/plain");
        dir.stage(&sub).await.unwrap();

        let fake = Arc::new(FakeScheduler::new());
        let handler = WordCountHandler::new(fake.clone(), Some("count.sh"));
        handler.validate(&dir, &sub).await.unwrap();
        handler.launch(&dir).await.unwrap();

        let (id, req) = fake.submitted().remove(0);
        assert_eq!(req.args, vec!["count.sh", "http://example.org/data"]);
        assert_eq!(handler.status(&dir).await.unwrap(), JobStatus::Queued);

        handler.delete(&dir).await.unwrap();
        assert_eq!(fake.cancelled(), vec![id]);
    }

    #[tokio::test]
    async fn failed_submission_records_nothing() {
        let base = tempfile::tempdir().unwrap();
        let dir = WorkingDir::allocate(base.path()).await.unwrap();
        dir.stage(&submission("http://example.org/data", "text/plain"))
            .await
            .unwrap();
        let fake = Arc::new(FakeScheduler::new());
        fake.fail_submissions(true);
        let handler = WordCountHandler::new(fake.clone(), None);

        assert!(matches!(
            handler.launch(&dir).await,
            Err(HandlerError::Scheduler(_))
        ));
        assert!(dir.read_optional("job_id").await.unwrap().is_none());
    }
}
