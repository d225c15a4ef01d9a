//! HTTP orchestrator for jobs run through process handlers.

pub mod config;
pub mod error;
mod response;
pub mod server;
