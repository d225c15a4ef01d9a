//! In-process handler that echoes its input. No external work is launched.

use crate::{document, Documentation, HandlerError, ProcessHandler, WorkingDir};
use async_trait::async_trait;
use job_media::choose;
use job_types::{JobStatus, Representation, Summary, APPLICATION_JSON, TEXT_PLAIN};

const DESCRIPTION: &str = "echo the input to stdout";

/// Accepts any input; `stdout` returns it unchanged and `stderr` is empty.
pub struct EchoHandler;

impl EchoHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessHandler for EchoHandler {
    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn document(&self, accept: Option<&str>) -> Result<Representation, HandlerError> {
        document(
            accept,
            &Documentation {
                description: DESCRIPTION.to_string(),
                input: "any data of any content type".to_string(),
                outputs: vec!["stdout".to_string(), "stderr".to_string()],
            },
        )
    }

    async fn launch(&self, dir: &WorkingDir) -> Result<(), HandlerError> {
        tracing::debug!(job_id = %dir.id(), "echo job needs no launch");
        Ok(())
    }

    async fn status(&self, _dir: &WorkingDir) -> Result<JobStatus, HandlerError> {
        Ok(JobStatus::Completed)
    }

    async fn info(
        &self,
        accept: Option<&str>,
        dir: &WorkingDir,
    ) -> Result<Representation, HandlerError> {
        let media_type = choose(accept, &[TEXT_PLAIN, APPLICATION_JSON])?;
        let data = dir.data().await?;
        let content_type = dir.content_type().await?;
        Ok(Summary::new()
            .field("process", "echo")
            .field("content type", content_type)
            .field("data length", data.len())
            .render(media_type))
    }

    async fn subpart(
        &self,
        accept: Option<&str>,
        dir: &WorkingDir,
        name: &str,
    ) -> Result<Representation, HandlerError> {
        match name {
            "stdout" => {
                let content_type = dir
                    .content_type()
                    .await?
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let available = [content_type];
                let media_type = choose(accept, &available)?.to_string();
                Ok(Representation::new(media_type, dir.data().await?))
            }
            "stderr" => {
                let media_type = choose(accept, &[TEXT_PLAIN])?;
                Ok(Representation::new(media_type, Vec::new()))
            }
            _ => Err(HandlerError::NotFound),
        }
    }
}
