//! Test harness wiring a `Pipeline` to a `ScriptedGateway`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use sourceintel::config::Settings;
use sourceintel::{JobRecord, JobStatus, Pipeline, PipelineEvent};

use super::builders::SettingsBuilder;
use super::gateway::ScriptedGateway;

/// Upper bound for any wait helper; generous because time may be paused.
const WAIT_LIMIT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct TestHarness {
    pub pipeline: Pipeline,
    pub gateway: Arc<ScriptedGateway>,
    pub settings: Settings,
    events: Receiver<PipelineEvent>,
}

impl TestHarness {
    /// Must be called from inside a tokio runtime.
    pub fn new() -> Self {
        Self::with_settings(SettingsBuilder::new().build())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let gateway = Arc::new(ScriptedGateway::new());
        let pipeline =
            Pipeline::new(&settings, gateway.clone()).expect("Failed to create pipeline");
        let events = pipeline.subscribe();
        Self {
            pipeline,
            gateway,
            settings,
            events,
        }
    }

    /// Polls until the job is completed or errored.
    pub async fn wait_for_terminal(&self, job_id: &str) -> JobRecord {
        tokio::time::timeout(WAIT_LIMIT, async {
            loop {
                match self.pipeline.get(job_id) {
                    Some(job) if job.status.is_terminal() => return job,
                    Some(_) => tokio::time::sleep(POLL_INTERVAL).await,
                    None => panic!("job {} disappeared while waiting", job_id),
                }
            }
        })
        .await
        .expect("job did not reach a terminal state")
    }

    pub async fn wait_for_status(&self, job_id: &str, status: JobStatus) -> JobRecord {
        tokio::time::timeout(WAIT_LIMIT, async {
            loop {
                if let Some(job) = self.pipeline.get(job_id) {
                    if job.status == status {
                        return job;
                    }
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .expect("job did not reach the expected status")
    }

    /// Every event received since the harness was built (or last drained).
    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => return events,
            }
        }
    }

    /// States one job went through, taken from store snapshots.
    pub fn history_of(events: &[PipelineEvent], job_id: &str) -> Vec<JobRecord> {
        events
            .iter()
            .filter_map(|event| match event {
                PipelineEvent::JobsChanged(jobs) => jobs.iter().find(|j| j.id == job_id).cloned(),
                _ => None,
            })
            .collect()
    }
}
