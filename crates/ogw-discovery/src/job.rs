//! Discovery job state machine (spec.md §4.6: "pending -> running ->
//! (complete | partial | failed)"), tracked in-memory and exposed for the
//! `discovery.job_status` utility tool (SPEC_FULL.md §4.6 supplement).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use ogw_domain::trace::TraceEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Complete,
    Partial,
    Failed,
}

impl JobState {
    fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Complete => "complete",
            JobState::Partial => "partial",
            JobState::Failed => "failed",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, JobState::Complete | JobState::Partial | JobState::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub kind: String,
    pub state: JobState,
    pub failure_reason: Option<String>,
}

struct JobRecord {
    kind: String,
    state: JobState,
    failure_reason: Option<String>,
}

/// Tracks every in-flight and recently-completed discovery job by id.
#[derive(Default)]
pub struct DiscoveryJobTracker {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

/// RAII handle for a single job: transitions the tracked state and, on
/// drop without an explicit terminal transition, marks the job `failed`
/// so a panicking discovery task never leaves a job stuck `running`.
pub struct JobHandle {
    tracker: Arc<DiscoveryJobTracker>,
    id: String,
    finished: bool,
}

impl DiscoveryJobTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a new job in `pending`, then immediately transitions it to
    /// `running` — a discovery job is always actively executing once it's
    /// handed out, there's no separate "queued" phase to observe here.
    pub fn start(self: &Arc<Self>, kind: impl Into<String>) -> JobHandle {
        let id = Uuid::new_v4().to_string();
        let kind = kind.into();
        self.jobs.lock().insert(id.clone(), JobRecord { kind: kind.clone(), state: JobState::Pending, failure_reason: None });
        self.transition(&id, JobState::Running, None);
        JobHandle { tracker: self.clone(), id, finished: false }
    }

    fn transition(&self, id: &str, to: JobState, failure_reason: Option<String>) {
        let mut jobs = self.jobs.lock();
        if let Some(record) = jobs.get_mut(id) {
            let from = record.state;
            record.state = to;
            record.failure_reason = failure_reason;
            TraceEvent::DiscoveryJobTransition { job_id: id.to_string(), from: from.as_str(), to: to.as_str() }.emit();
        }
    }

    pub fn status(&self, id: &str) -> Option<JobStatus> {
        let jobs = self.jobs.lock();
        jobs.get(id).map(|r| JobStatus {
            job_id: id.to_string(),
            kind: r.kind.clone(),
            state: r.state,
            failure_reason: r.failure_reason.clone(),
        })
    }
}

impl JobHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn complete(mut self) {
        self.tracker.transition(&self.id, JobState::Complete, None);
        self.finished = true;
    }

    pub fn partial(mut self, failed_sub_queries: &[String]) {
        self.tracker.transition(&self.id, JobState::Partial, Some(failed_sub_queries.join(", ")));
        self.finished = true;
    }

    /// Cancellation via request deadline transitions any non-terminal state
    /// to `failed` with reason `timeout` (spec.md §4.6).
    pub fn fail(mut self, reason: impl Into<String>) {
        self.tracker.transition(&self.id, JobState::Failed, Some(reason.into()));
        self.finished = true;
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if !self.finished {
            let mut jobs = self.tracker.jobs.lock();
            if let Some(record) = jobs.get_mut(&self.id) {
                if !record.state.is_terminal() {
                    record.state = JobState::Failed;
                    record.failure_reason = Some("job dropped without reaching a terminal state".into());
                }
            }
        }
    }
}
