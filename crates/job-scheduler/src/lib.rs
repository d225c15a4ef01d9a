//! External batch scheduler: submit, list status, cancel.
//!
//! The scheduler is an opaque external service. Its textual acknowledgement and status
//! report formats are parsed in `report`, independently of how the commands are run.

#[cfg(feature = "test-util")]
pub mod fake;
pub mod report;
mod sge;
mod trait_;

pub use report::{parse_status_listing, parse_submit_ack, status_from_code};
pub use sge::{SgeConfig, SgeScheduler};
pub use trait_::{BatchScheduler, ExternalJobId, SchedulerError, StatusEntry, SubmitRequest};

#[cfg(feature = "test-util")]
pub use fake::FakeScheduler;
