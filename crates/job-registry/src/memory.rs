//! In-memory registry (process lifetime only).

use async_trait::async_trait;
use job_types::{JobRecord, JobRegistry, RegistryError};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory JobRegistry: rows live in a map guarded by a single lock, so every
/// operation is atomic with respect to the others.
pub struct InMemoryJobRegistry {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of rows, deleted ones included.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for InMemoryJobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn insert(&self, id: &str, process: &str) -> Result<(), RegistryError> {
        let mut guard = self.jobs.write().await;
        if guard.contains_key(id) {
            return Err(RegistryError::AlreadyExists(id.to_string()));
        }
        guard.insert(
            id.to_string(),
            JobRecord {
                id: id.to_string(),
                process: process.to_string(),
                deleted: false,
            },
        );
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<JobRecord>, RegistryError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn mark_deleted(&self, id: &str) -> Result<bool, RegistryError> {
        let mut guard = self.jobs.write().await;
        let record = guard
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let flipped = !record.deleted;
        record.deleted = true;
        Ok(flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_get_and_soft_delete() {
        let registry = InMemoryJobRegistry::new();
        registry.insert("abc", "wc").await.unwrap();

        let record = registry.get("abc").await.unwrap().unwrap();
        assert_eq!(record.process, "wc");
        assert!(!record.deleted);

        assert!(registry.mark_deleted("abc").await.unwrap());
        assert!(!registry.mark_deleted("abc").await.unwrap());

        let record = registry.get("abc").await.unwrap().unwrap();
        assert!(record.deleted);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_and_unknown_ids() {
        let registry = InMemoryJobRegistry::new();
        registry.insert("abc", "wc").await.unwrap();
        assert!(matches!(
            registry.insert("abc", "echo").await,
            Err(RegistryError::AlreadyExists(_))
        ));
        assert_eq!(registry.get("abc").await.unwrap().unwrap().process, "wc");

        assert!(registry.get("nope").await.unwrap().is_none());
        assert!(matches!(
            registry.mark_deleted("nope").await,
            Err(RegistryError::NotFound(_))
        ));
    }
}
