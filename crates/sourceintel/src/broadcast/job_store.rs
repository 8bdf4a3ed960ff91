//! In-memory job store.
//!
//! The store owns every [`JobRecord`] and is the only place they change.
//! Mutations are typed [`JobUpdate`]s checked against the job state machine:
//!
//! ```text
//! pending ──Start──▶ processing ──Complete──▶ completed
//!    │                   │
//!    └──────Fail─────────┴──────Fail───────▶ error ──Reset──▶ pending
//! ```
//!
//! Each committed mutation broadcasts a fresh snapshot of the whole store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;

use crate::broadcast::events::{EventBroadcaster, PipelineEvent};
use crate::error::StoreError;
use crate::job::{JobKind, JobPayload, JobRecord, JobStatus};
use crate::normalizer::IntelligenceRecord;

/// A keyed change to one job.
#[derive(Debug, Clone)]
pub enum JobUpdate {
    /// `pending` → `processing`, progress 0.
    Start,
    /// Advance progress while `processing`. Lower values are ignored.
    Progress { progress: u8, message: String },
    /// `processing` → `completed`, progress 100.
    Complete(IntelligenceRecord),
    /// `pending`/`processing` → `error`, progress unchanged.
    Fail(String),
    /// `error` → `pending`, progress 0, error cleared.
    Reset,
}

impl JobUpdate {
    fn target(&self) -> JobStatus {
        match self {
            JobUpdate::Start | JobUpdate::Progress { .. } => JobStatus::Processing,
            JobUpdate::Complete(_) => JobStatus::Completed,
            JobUpdate::Fail(_) => JobStatus::Error,
            JobUpdate::Reset => JobStatus::Pending,
        }
    }

    fn allowed_from(&self, status: JobStatus) -> bool {
        matches!(
            (self, status),
            (JobUpdate::Start, JobStatus::Pending)
                | (JobUpdate::Progress { .. }, JobStatus::Processing)
                | (JobUpdate::Complete(_), JobStatus::Processing)
                | (JobUpdate::Fail(_), JobStatus::Pending | JobStatus::Processing)
                | (JobUpdate::Reset, JobStatus::Error)
        )
    }
}

/// Number of jobs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub error: usize,
}

impl JobCounts {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.error
    }
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, JobRecord>,
    /// Ids in submission order.
    order: Vec<String>,
}

impl Inner {
    fn snapshot(&self) -> Vec<JobRecord> {
        self.order
            .iter()
            .filter_map(|id| self.jobs.get(id))
            .cloned()
            .collect()
    }
}

pub struct JobStore {
    inner: RwLock<Inner>,
    events: EventBroadcaster,
}

impl JobStore {
    pub fn new(events: EventBroadcaster) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Snapshot is sent while the write lock is held, so subscribers see
    /// snapshots in commit order.
    fn publish(&self, inner: &Inner) {
        self.events.send(PipelineEvent::JobsChanged(inner.snapshot()));
    }

    /// Registers a new pending job.
    pub fn create(&self, kind: JobKind, payload: JobPayload) -> JobRecord {
        let record = JobRecord::new(kind, payload);
        let mut inner = self.write();
        inner.order.push(record.id.clone());
        inner.jobs.insert(record.id.clone(), record.clone());
        self.publish(&inner);
        record
    }

    /// Applies `update` if the job exists and the transition is legal.
    pub fn apply(&self, id: &str, update: JobUpdate) -> Result<JobRecord, StoreError> {
        let mut inner = self.write();
        let job = inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !update.allowed_from(job.status) {
            return Err(StoreError::IllegalTransition {
                job_id: id.to_string(),
                from: job.status,
                to: update.target(),
            });
        }

        match update {
            JobUpdate::Start => {
                job.status = JobStatus::Processing;
                job.progress = 0;
                job.message = None;
            }
            JobUpdate::Progress { progress, message } => {
                job.progress = job.progress.max(progress.min(100));
                job.message = Some(message);
            }
            JobUpdate::Complete(result) => {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.result = Some(result);
                job.error = None;
            }
            JobUpdate::Fail(reason) => {
                job.status = JobStatus::Error;
                job.result = None;
                job.error = Some(reason);
            }
            JobUpdate::Reset => {
                job.status = JobStatus::Pending;
                job.progress = 0;
                job.error = None;
                job.message = None;
                job.attempts += 1;
            }
        }
        job.updated_at = Utc::now();

        let updated = job.clone();
        self.publish(&inner);
        Ok(updated)
    }

    pub fn get(&self, id: &str) -> Option<JobRecord> {
        self.read().jobs.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().jobs.contains_key(id)
    }

    /// All jobs in submission order.
    pub fn list(&self) -> Vec<JobRecord> {
        self.read().snapshot()
    }

    /// Removes a job in any state. Unknown ids are a no-op.
    pub fn remove(&self, id: &str) -> Option<JobRecord> {
        let mut inner = self.write();
        let removed = inner.jobs.remove(id)?;
        inner.order.retain(|existing| existing != id);
        self.publish(&inner);
        Some(removed)
    }

    pub fn counts(&self) -> JobCounts {
        let inner = self.read();
        inner
            .jobs
            .values()
            .fold(JobCounts::default(), |mut counts, job| {
                match job.status {
                    JobStatus::Pending => counts.pending += 1,
                    JobStatus::Processing => counts.processing += 1,
                    JobStatus::Completed => counts.completed += 1,
                    JobStatus::Error => counts.error += 1,
                }
                counts
            })
    }

    pub fn len(&self) -> usize {
        self.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(EventBroadcaster::default())
    }
}
