//! Server configuration: listen address, storage location and the process table.
//!
//! Processes are given as comma separated `label=kind[:arg...]` entries, e.g.
//! `echo=echo,wc=word_count:wc.sge,csv=batch:csv2json.sh:text/csv`.

use crate::server::ProcessCatalog;
use job_handlers::{BatchScriptHandler, EchoHandler, ProcessHandler, WordCountHandler};
use job_scheduler::{BatchScheduler, SgeConfig};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_LISTEN: &str = "0.0.0.0:8081";
const DEFAULT_BASE_DIR: &str = "./jobs";
const DEFAULT_PROCESSES: &str = "echo=echo,wc=word_count";
/// Matches axum's own default request body limit.
pub const DEFAULT_MAX_BODY: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address {0:?}")]
    Listen(String),
    #[error("invalid body limit {0:?}")]
    MaxBody(String),
    #[error("invalid process entry {entry:?}: {reason}")]
    Process { entry: String, reason: String },
}

/// Handler implementation a process label is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Echo,
    WordCount,
    Batch,
}

impl HandlerKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "echo" => Some(HandlerKind::Echo),
            "word_count" | "wc" => Some(HandlerKind::WordCount),
            "batch" => Some(HandlerKind::Batch),
            _ => None,
        }
    }
}

/// Handler kind plus its constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub kind: HandlerKind,
    pub args: Vec<String>,
}

impl ProcessSpec {
    pub fn new(kind: HandlerKind, args: &[&str]) -> Self {
        Self {
            kind,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn check_args(&self) -> Result<(), String> {
        match (self.kind, self.args.len()) {
            (HandlerKind::Echo, 0) => Ok(()),
            (HandlerKind::Echo, _) => Err("echo takes no arguments".to_string()),
            (HandlerKind::WordCount, 0 | 1) => Ok(()),
            (HandlerKind::WordCount, _) => Err("word_count takes at most a script".to_string()),
            (HandlerKind::Batch, 0) => Err("batch requires a script".to_string()),
            (HandlerKind::Batch, _) => Ok(()),
        }
    }

    /// Construct the handler.
    pub fn build(&self, scheduler: Arc<dyn BatchScheduler>) -> Result<Arc<dyn ProcessHandler>, String> {
        self.check_args()?;
        let handler: Arc<dyn ProcessHandler> = match (self.kind, self.args.split_first()) {
            (HandlerKind::Echo, _) => Arc::new(EchoHandler::new()),
            (HandlerKind::WordCount, first) => Arc::new(WordCountHandler::new(
                scheduler,
                first.map(|(script, _)| script.as_str()),
            )),
            (HandlerKind::Batch, Some((script, types))) => Arc::new(BatchScriptHandler::new(
                scheduler,
                script.clone(),
                types.to_vec(),
            )),
            (HandlerKind::Batch, None) => return Err("batch requires a script".to_string()),
        };
        Ok(handler)
    }
}

/// Immutable server configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub base_dir: PathBuf,
    /// Prefix for `Location` headers; relative locations when unset.
    pub public_url: Option<String>,
    pub processes: BTreeMap<String, ProcessSpec>,
    pub scheduler: SgeConfig,
    /// Largest accepted submission body in bytes; larger bodies get 413.
    pub max_body: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen = std::env::var("JOBGATE_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
        let listen = listen.parse().map_err(|_| ConfigError::Listen(listen))?;
        let base_dir = std::env::var("JOBGATE_BASE_DIR")
            .unwrap_or_else(|_| DEFAULT_BASE_DIR.to_string())
            .into();
        let processes = parse_processes(
            &std::env::var("JOBGATE_PROCESSES").unwrap_or_else(|_| DEFAULT_PROCESSES.to_string()),
        )?;
        let max_body = match std::env::var("JOBGATE_MAX_BODY") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::MaxBody(raw))?,
            Err(_) => DEFAULT_MAX_BODY,
        };
        Ok(Self {
            listen,
            base_dir,
            public_url: std::env::var("JOBGATE_PUBLIC_URL").ok(),
            processes,
            scheduler: SgeConfig::from_env(),
            max_body,
        })
    }

    /// Instantiate every configured handler.
    pub fn catalog(&self, scheduler: Arc<dyn BatchScheduler>) -> Result<ProcessCatalog, ConfigError> {
        self.processes
            .iter()
            .map(|(label, spec)| {
                let handler = spec
                    .build(Arc::clone(&scheduler))
                    .map_err(|reason| ConfigError::Process {
                        entry: label.clone(),
                        reason,
                    })?;
                Ok((label.clone(), handler))
            })
            .collect()
    }
}

/// Parse the process table.
pub fn parse_processes(spec: &str) -> Result<BTreeMap<String, ProcessSpec>, ConfigError> {
    let mut processes = BTreeMap::new();
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let invalid = |reason: &str| ConfigError::Process {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };
        let (label, handler) = entry
            .split_once('=')
            .ok_or_else(|| invalid("expected label=kind"))?;
        let label = label.trim().trim_matches('/');
        if label.is_empty() || label.contains('/') {
            return Err(invalid("label must be a single path segment"));
        }
        if label == "job" {
            return Err(invalid("label \"job\" is reserved"));
        }
        let mut parts = handler.trim().split(':');
        let kind = parts
            .next()
            .and_then(HandlerKind::parse)
            .ok_or_else(|| invalid("unknown handler kind"))?;
        let spec = ProcessSpec {
            kind,
            args: parts.map(str::to_string).collect(),
        };
        spec.check_args().map_err(|reason| invalid(&reason))?;
        if processes.insert(label.to_string(), spec).is_some() {
            return Err(invalid("duplicate label"));
        }
    }
    Ok(processes)
}
