//! Process handlers: the per-process logic that validates, launches and reports on jobs.

mod batch;
mod echo;
mod external;
mod handler;
mod word_count;
mod workdir;

pub use batch::BatchScriptHandler;
pub use echo::EchoHandler;
pub use external::ExternalJob;
pub use handler::{document, Documentation, HandlerError, ProcessHandler, Rejection};
pub use word_count::WordCountHandler;
pub use workdir::{Submission, WorkingDir};
