//! Core types and traits shared by the jobgate crates.
//!
//! The registry trait lives here so that the orchestrator and the storage backends
//! agree on existence and soft-deletion semantics without depending on each other.

mod dto;
mod traits;

pub use dto::*;
pub use traits::*;
