//! Public entry point: submit sources, watch jobs, collect intelligence.
//!
//! Every call returns immediately. Work runs on the tokio runtime the
//! pipeline was created on; callers observe it through [`Pipeline::subscribe`]
//! or by polling [`Pipeline::snapshot`]. Failures never surface as errors
//! from `submit`/`retry`/`remove`; they end up in the job's `error` field.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::adapter::IngestionDriver;
use crate::broadcast::{EventBroadcaster, JobCounts, JobStore, JobUpdate, PipelineEvent};
use crate::config::{validate_settings, Settings};
use crate::error::{ConfigError, Result, SourceIntelError};
use crate::gateway::{AnalysisGateway, AnalysisType, HttpGateway};
use crate::job::{JobPayload, JobRecord, SourceDocument};
use crate::normalizer::Normalizer;
use crate::scheduler::{BatchReport, BatchScheduler};

/// Jobs created by [`Pipeline::submit_batch`].
pub struct BatchSubmission {
    pub batch_id: String,
    /// In input order, invalid entries already dropped.
    pub job_ids: Vec<String>,
    handle: JoinHandle<BatchReport>,
}

impl BatchSubmission {
    /// Waits until every item is terminal or skipped.
    pub async fn wait(self) -> Result<BatchReport> {
        self.handle
            .await
            .map_err(|e| SourceIntelError::BatchAborted {
                batch_id: self.batch_id,
                reason: e.to_string(),
            })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

pub struct Pipeline {
    driver: Arc<IngestionDriver>,
    scheduler: Arc<BatchScheduler>,
    runtime: Handle,
    batch_analysis_type: AnalysisType,
}

impl Pipeline {
    /// Creates a pipeline that talks to `gateway`.
    ///
    /// Must be called from within a tokio runtime. Settings are validated
    /// again here since they need not come from [`crate::load_settings`], and
    /// a campaign id is required.
    pub fn new(settings: &Settings, gateway: Arc<dyn AnalysisGateway>) -> Result<Self> {
        validate_settings(settings)?;
        if settings.campaign_id.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "campaignId must not be empty".to_string(),
            }
            .into());
        }
        let runtime = Handle::try_current().map_err(|_| SourceIntelError::NoRuntime)?;

        let store = Arc::new(JobStore::new(EventBroadcaster::new(
            settings.events.capacity,
        )));
        let driver = Arc::new(IngestionDriver::new(
            store,
            gateway,
            Normalizer::new(settings.normalizer),
            settings.campaign_id.clone(),
            settings.gateway.timeout(),
        ));
        let scheduler = Arc::new(BatchScheduler::new(
            Arc::clone(&driver),
            settings.batch.delay(),
        ));

        log::info!(
            "Pipeline ready for campaign '{}' (timeout {}s, batch delay {}ms)",
            settings.campaign_id,
            settings.gateway.timeout_secs,
            settings.batch.delay_ms
        );

        Ok(Self {
            driver,
            scheduler,
            runtime,
            batch_analysis_type: settings.gateway.default_analysis_type,
        })
    }

    /// Creates a pipeline backed by the HTTP gateway described in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let gateway = HttpGateway::from_settings(&settings.gateway)?;
        Self::new(settings, Arc::new(gateway))
    }

    fn store(&self) -> &JobStore {
        self.driver.store()
    }

    /// Registers a job for `payload` and starts processing it.
    ///
    /// Invalid input yields a job that is already in `error` and never
    /// reaches `processing`.
    pub fn submit(&self, payload: JobPayload) -> String {
        let kind = payload.default_kind();
        let validation = self.driver.adapter_for(kind).prepare(&payload);
        let job = self.store().create(kind, payload);

        if let Err(e) = validation {
            log::warn!("Job {} rejected: {}", job.id, e);
            if let Err(e) = self.store().apply(&job.id, JobUpdate::Fail(e.to_string())) {
                log::debug!("Could not mark job {} failed: {}", job.id, e);
            }
            return job.id;
        }

        self.spawn(job.id.clone());
        job.id
    }

    pub fn submit_url(&self, url: impl Into<String>, analysis_type: AnalysisType) -> String {
        self.submit(JobPayload::url(url, analysis_type))
    }

    pub fn submit_document(&self, document: SourceDocument) -> String {
        self.submit(JobPayload::document(document))
    }

    pub fn submit_video(&self, url: impl Into<String>) -> String {
        self.submit(JobPayload::video(url))
    }

    /// Re-runs a failed job with its original payload. No-op unless the job
    /// is in `error`.
    pub fn retry(&self, job_id: &str) {
        match self.store().apply(job_id, JobUpdate::Reset) {
            Ok(job) => {
                log::info!("Retrying job {} (attempt {})", job.id, job.attempts + 1);
                self.spawn(job.id);
            }
            Err(e) => log::debug!("Retry ignored: {}", e),
        }
    }

    /// Forgets a job in any state. An outstanding gateway result for it is
    /// discarded when it arrives.
    pub fn remove(&self, job_id: &str) {
        if self.store().remove(job_id).is_some() {
            log::info!("Job {} removed", job_id);
        }
    }

    /// Creates one job per valid URL, in input order, and processes them
    /// sequentially with the configured delay between items.
    pub fn submit_batch<I, S>(&self, urls: I) -> BatchSubmission
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let job_ids: Vec<String> = self
            .scheduler
            .enqueue(urls, self.batch_analysis_type)
            .into_iter()
            .map(|job| job.id)
            .collect();
        let batch_id = uuid::Uuid::new_v4().to_string();

        let scheduler = Arc::clone(&self.scheduler);
        let handle = self.runtime.spawn({
            let batch_id = batch_id.clone();
            let job_ids = job_ids.clone();
            async move { scheduler.run(batch_id, job_ids).await }
        });

        BatchSubmission {
            batch_id,
            job_ids,
            handle,
        }
    }

    pub fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.store().get(job_id)
    }

    /// All jobs in submission order.
    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.store().list()
    }

    pub fn counts(&self) -> JobCounts {
        self.store().counts()
    }

    /// Streams store snapshots, completed intelligence and batch reports.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.store().events().subscribe()
    }

    fn spawn(&self, job_id: String) {
        let driver = Arc::clone(&self.driver);
        self.runtime.spawn(async move {
            driver.run(&job_id).await;
        });
    }
}
