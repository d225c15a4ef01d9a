//! Registry trait: the single source of truth for job existence and deletion.

use crate::JobRecord;
use async_trait::async_trait;

/// Durable mapping of job id -> process name + soft-deleted flag.
///
/// Contract: `get` returns `Ok(None)` for an unknown id; a known but deleted job is
/// returned with `deleted == true`. Rows are never physically removed.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Record a newly submitted job. Fails with `AlreadyExists` if the id is taken.
    async fn insert(&self, id: &str, process: &str) -> Result<(), RegistryError>;

    /// Look up a job by id.
    async fn get(&self, id: &str) -> Result<Option<JobRecord>, RegistryError>;

    /// Flag a job as deleted. Returns `true` if this call flipped the flag and `false`
    /// if it was already set. Fails with `NotFound` if the id is unknown.
    async fn mark_deleted(&self, id: &str) -> Result<bool, RegistryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("job already exists: {0}")]
    AlreadyExists(String),
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("registry error: {0}")]
    Other(String),
}
