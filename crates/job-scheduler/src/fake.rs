//! Fake scheduler for tests: in-memory job table, no external commands.

use crate::{BatchScheduler, ExternalJobId, SchedulerError, StatusEntry, SubmitRequest};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct FakeState {
    next_id: ExternalJobId,
    jobs: BTreeMap<ExternalJobId, String>,
    submitted: Vec<(ExternalJobId, SubmitRequest)>,
    cancelled: Vec<ExternalJobId>,
    fail_submissions: bool,
}

/// Scheduler stand-in. New jobs enter `qw`; tests move them through states with
/// `set_code` and make them disappear with `finish`, as a real scheduler forgets
/// finished jobs.
pub struct FakeScheduler {
    state: Mutex<FakeState>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1000,
                ..FakeState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        // a panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every following `submit` fail.
    pub fn fail_submissions(&self, fail: bool) {
        self.lock().fail_submissions = fail;
    }

    /// Set the state code reported for a job.
    pub fn set_code(&self, id: ExternalJobId, code: &str) {
        self.lock().jobs.insert(id, code.to_string());
    }

    /// Drop a job from the report and write its captured output files.
    pub fn finish(&self, id: ExternalJobId, stdout: &str, stderr: &str) -> std::io::Result<()> {
        let req = {
            let mut guard = self.lock();
            guard.jobs.remove(&id);
            guard
                .submitted
                .iter()
                .find(|(sid, _)| *sid == id)
                .map(|(_, req)| req.clone())
        };
        if let Some(req) = req {
            std::fs::write(&req.stdout, stdout)?;
            std::fs::write(&req.stderr, stderr)?;
        }
        Ok(())
    }

    /// Submissions accepted so far, oldest first.
    pub fn submitted(&self) -> Vec<(ExternalJobId, SubmitRequest)> {
        self.lock().submitted.clone()
    }

    pub fn last_submitted(&self) -> Option<ExternalJobId> {
        self.lock().submitted.last().map(|(id, _)| *id)
    }

    /// Ids passed to `cancel`, in call order.
    pub fn cancelled(&self) -> Vec<ExternalJobId> {
        self.lock().cancelled.clone()
    }
}

impl Default for FakeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BatchScheduler for FakeScheduler {
    async fn submit(&self, req: &SubmitRequest) -> Result<ExternalJobId, SchedulerError> {
        let mut guard = self.lock();
        if guard.fail_submissions {
            return Err(SchedulerError::CommandFailed {
                command: "qsub".to_string(),
                code: Some(1),
                stderr: "submissions disabled".to_string(),
            });
        }
        let id = guard.next_id;
        guard.next_id += 1;
        guard.jobs.insert(id, "qw".to_string());
        guard.submitted.push((id, req.clone()));
        Ok(id)
    }

    async fn list_status(&self) -> Result<Vec<StatusEntry>, SchedulerError> {
        Ok(self
            .lock()
            .jobs
            .iter()
            .map(|(id, code)| StatusEntry {
                id: *id,
                code: code.clone(),
            })
            .collect())
    }

    async fn cancel(&self, id: ExternalJobId) -> Result<(), SchedulerError> {
        let mut guard = self.lock();
        guard.cancelled.push(id);
        guard.jobs.remove(&id);
        Ok(())
    }
}
