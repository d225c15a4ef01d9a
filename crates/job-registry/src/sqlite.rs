//! SQLite-backed registry (durable across restarts).

use async_trait::async_trait;
use job_types::{JobRecord, JobRegistry, RegistryError};
use std::path::Path;
use std::time::Duration;

/// SQLite-backed JobRegistry. Each operation runs as one statement or one transaction.
pub struct SqliteJobRegistry {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteJobRegistry {
    /// Open (or create) the registry database at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let conn =
            rusqlite::Connection::open(path).map_err(|e| RegistryError::Other(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| RegistryError::Other(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS job (
                id TEXT NOT NULL PRIMARY KEY,
                process TEXT NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .map_err(|e| RegistryError::Other(e.to_string()))?;
        tracing::debug!(path = %path.display(), "job registry opened");

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RegistryError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(|e| RegistryError::Other(e.to_string()))
    }
}

#[async_trait]
impl JobRegistry for SqliteJobRegistry {
    async fn insert(&self, id: &str, process: &str) -> Result<(), RegistryError> {
        let inserted = self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO job (id, process) VALUES (?1, ?2)",
                rusqlite::params![id, process],
            )
        })?;
        if inserted == 0 {
            return Err(RegistryError::AlreadyExists(id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<JobRecord>, RegistryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, process, deleted FROM job WHERE id = ?1")?;
            let result = stmt.query_row([id], |row| {
                Ok(JobRecord {
                    id: row.get(0)?,
                    process: row.get(1)?,
                    deleted: row.get(2)?,
                })
            });
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    async fn mark_deleted(&self, id: &str) -> Result<bool, RegistryError> {
        let outcome = self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let flipped = tx.execute(
                "UPDATE job SET deleted = 1 WHERE id = ?1 AND deleted = 0",
                [id],
            )?;
            let exists = flipped > 0
                || tx
                    .prepare("SELECT 1 FROM job WHERE id = ?1")?
                    .exists([id])?;
            tx.commit()?;
            Ok((exists, flipped > 0))
        })?;
        match outcome {
            (false, _) => Err(RegistryError::NotFound(id.to_string())),
            (true, flipped) => Ok(flipped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.sqlite");
        {
            let registry = SqliteJobRegistry::new(&path).unwrap();
            registry.insert("j1", "wc").await.unwrap();
            registry.insert("j2", "echo").await.unwrap();
            assert!(registry.mark_deleted("j2").await.unwrap());
        }

        let registry = SqliteJobRegistry::new(&path).unwrap();
        let j1 = registry.get("j1").await.unwrap().unwrap();
        assert_eq!(j1.process, "wc");
        assert!(!j1.deleted);
        let j2 = registry.get("j2").await.unwrap().unwrap();
        assert!(j2.deleted);
        assert!(!registry.mark_deleted("j2").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SqliteJobRegistry::new(dir.path().join("jobs.sqlite")).unwrap();
        registry.insert("j1", "wc").await.unwrap();
        assert!(matches!(
            registry.insert("j1", "echo").await,
            Err(RegistryError::AlreadyExists(_))
        ));
        assert_eq!(registry.get("j1").await.unwrap().unwrap().process, "wc");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SqliteJobRegistry::new(dir.path().join("jobs.sqlite")).unwrap();
        assert!(registry.get("missing").await.unwrap().is_none());
        assert!(matches!(
            registry.mark_deleted("missing").await,
            Err(RegistryError::NotFound(_))
        ));
    }
}
