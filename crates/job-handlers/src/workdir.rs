//! Per-job working directories.
//!
//! Layout: `data` (submitted bytes), `content-type` (declared type), plus whatever the
//! handler writes (`job_id`, `stdout`, `stderr`).

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DATA: &str = "data";
const CONTENT_TYPE: &str = "content-type";
const ID_LEN: usize = 12;

/// What a client posted to a process.
#[derive(Debug, Clone)]
pub struct Submission {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// The exclusive on-disk area of one job. Its directory name is the job id.
#[derive(Debug, Clone)]
pub struct WorkingDir {
    id: String,
    path: PathBuf,
}

impl WorkingDir {
    /// Create a fresh directory with a unique name under `base`.
    ///
    /// Uniqueness is decided by `create_dir` itself, so concurrent allocations never
    /// share a directory.
    pub async fn allocate(base: &Path) -> io::Result<Self> {
        loop {
            let id: String = Uuid::new_v4().simple().to_string()[..ID_LEN].to_string();
            let path = base.join(&id);
            match tokio::fs::create_dir(&path).await {
                Ok(()) => return Ok(Self { id, path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Handle to an existing job's directory. Does not touch the filesystem.
    pub fn open(base: &Path, id: &str) -> Self {
        Self {
            id: id.to_string(),
            path: base.join(id),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Write the submitted data and its declared content type.
    pub async fn stage(&self, submission: &Submission) -> io::Result<()> {
        self.write(DATA, &submission.data).await?;
        self.write(CONTENT_TYPE, submission.content_type.as_bytes())
            .await
    }

    pub async fn data(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.file(DATA)).await
    }

    /// The declared content type, if one was staged.
    pub async fn content_type(&self) -> io::Result<Option<String>> {
        Ok(self
            .read_optional(CONTENT_TYPE)
            .await?
            .map(|b| String::from_utf8_lossy(&b).trim().to_string()))
    }

    /// Read a file, mapping "does not exist" to `None`.
    pub async fn read_optional(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.file(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.file(name), bytes).await
    }

    /// Remove the directory and everything in it. A directory that is already gone
    /// is not an error.
    pub async fn remove(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
