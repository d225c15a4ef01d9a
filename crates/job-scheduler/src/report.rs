//! Parsing of the scheduler's acknowledgement and status report text.

use crate::{ExternalJobId, SchedulerError, StatusEntry};
use job_types::JobStatus;
use regex::Regex;
use std::sync::LazyLock;

static SUBMIT_ACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Your job (\d+) \(.*\) has been submitted")
        .expect("constant regex pattern is valid")
});

/// Extract the job id from a submission acknowledgement such as
/// `Your job 4711 ("wc.sge") has been submitted`.
pub fn parse_submit_ack(text: &str) -> Result<ExternalJobId, SchedulerError> {
    let caps = SUBMIT_ACK
        .captures(text)
        .ok_or_else(|| SchedulerError::UnexpectedOutput(text.trim().to_string()))?;
    caps[1]
        .parse()
        .map_err(|_| SchedulerError::UnexpectedOutput(text.trim().to_string()))
}

/// Parse the tabular status report into (id, state code) rows.
///
/// Header and separator lines are skipped; the id is the first column and the state
/// code the fifth.
pub fn parse_status_listing(text: &str) -> Result<Vec<StatusEntry>, SchedulerError> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("job-ID") || trimmed.starts_with("------") {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 5 {
            return Err(SchedulerError::UnexpectedOutput(line.to_string()));
        }
        let id = fields[0]
            .parse()
            .map_err(|_| SchedulerError::UnexpectedOutput(line.to_string()))?;
        entries.push(StatusEntry {
            id,
            code: fields[4].to_string(),
        });
    }
    Ok(entries)
}

/// Map a scheduler state code to a logical job status.
///
/// Any code carrying `E` is an error state. A job that has started stays `running`
/// while it is suspended, held or being deleted; one that has not started is `queued`.
/// Codes outside the documented set are reported as `UnknownStatus` rather than guessed.
pub fn status_from_code(code: &str) -> Result<JobStatus, SchedulerError> {
    if code.contains('E') {
        return Ok(JobStatus::Error);
    }
    match code {
        "r" | "t" | "Rr" | "Rt" | "s" | "ts" | "S" | "tS" | "T" | "tT" | "hr" | "dr" | "dt"
        | "ds" | "dS" | "dT" => Ok(JobStatus::Running),
        "qw" | "hqw" | "hRwq" | "Rq" | "hRq" => Ok(JobStatus::Queued),
        other => Err(SchedulerError::UnknownStatus(other.to_string())),
    }
}
