//! Generic scheduler-backed handler: runs a configured script on the staged data file.

use crate::{
    document, Documentation, ExternalJob, HandlerError, ProcessHandler, Rejection, Submission,
    WorkingDir,
};
use async_trait::async_trait;
use job_scheduler::BatchScheduler;
use job_types::{JobStatus, Representation};
use std::sync::Arc;

/// Submits `<script> <working dir>/data`. When `accepted_types` is non-empty, only
/// those content types are taken.
pub struct BatchScriptHandler {
    script: String,
    accepted_types: Vec<String>,
    description: String,
    external: ExternalJob,
}

impl BatchScriptHandler {
    pub fn new(
        scheduler: Arc<dyn BatchScheduler>,
        script: impl Into<String>,
        accepted_types: Vec<String>,
    ) -> Self {
        let script = script.into();
        Self {
            description: format!("batch script {}", script),
            script,
            accepted_types,
            external: ExternalJob::new(scheduler),
        }
    }
}

#[async_trait]
impl ProcessHandler for BatchScriptHandler {
    fn description(&self) -> &str {
        &self.description
    }

    fn document(&self, accept: Option<&str>) -> Result<Representation, HandlerError> {
        let input = if self.accepted_types.is_empty() {
            "any data; the script receives the path of the staged file".to_string()
        } else {
            format!("one of {}", self.accepted_types.join(", "))
        };
        document(
            accept,
            &Documentation {
                description: self.description.clone(),
                input,
                outputs: vec!["stdout".to_string(), "stderr".to_string()],
            },
        )
    }

    async fn validate(
        &self,
        _dir: &WorkingDir,
        submission: &Submission,
    ) -> Result<(), HandlerError> {
        if !self.accepted_types.is_empty()
            && !self.accepted_types.contains(&submission.content_type)
        {
            return Err(Rejection::UnsupportedMediaType.into());
        }
        Ok(())
    }

    async fn launch(&self, dir: &WorkingDir) -> Result<(), HandlerError> {
        let data = dir.file("data").to_string_lossy().into_owned();
        self.external
            .submit(dir, vec![self.script.clone(), data])
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
