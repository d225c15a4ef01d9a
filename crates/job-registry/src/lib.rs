//! Job registry implementations.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use job_types::{JobRecord, JobRegistry, RegistryError};
pub use memory::InMemoryJobRegistry;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteJobRegistry;
