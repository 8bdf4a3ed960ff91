//! Ingestion adapters and the driver that runs a job through them.
//!
//! An adapter knows how to turn one kind of payload into a gateway request
//! and which checkpoints to report on the way. [`IngestionDriver`] does the
//! rest for every kind: state transitions, the timed gateway call,
//! normalization and notification.

pub mod document;
pub mod url;
pub mod video;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info_span, Instrument};

use crate::broadcast::{JobStore, JobUpdate, PipelineEvent};
use crate::error::{GatewayError, StoreError, ValidationError};
use crate::gateway::{AnalysisGateway, GatewayRequest};
use crate::job::{CheckpointName, CheckpointPlan, JobKind, JobPayload, JobStatus};
use crate::normalizer::Normalizer;
use crate::sanitize;

pub use document::DocumentAdapter;
pub use url::{parse_web_url, UrlAdapter};
pub use video::VideoAdapter;

/// Per-kind ingestion behaviour.
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Progress staging for one attempt.
    fn plan(&self) -> CheckpointPlan;

    /// Validates the payload and builds the single gateway call for it.
    fn prepare(&self, payload: &JobPayload) -> Result<GatewayRequest, ValidationError>;
}

/// How a drive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Completed,
    Failed,
    /// The job was missing, not pending, or removed mid-flight.
    Ignored,
}

/// Runs pending jobs through their adapter against one gateway.
pub struct IngestionDriver {
    store: Arc<JobStore>,
    gateway: Arc<dyn AnalysisGateway>,
    normalizer: Normalizer,
    campaign_id: String,
    timeout: Duration,
    url: UrlAdapter,
    document: DocumentAdapter,
    video: VideoAdapter,
}

impl IngestionDriver {
    pub fn new(
        store: Arc<JobStore>,
        gateway: Arc<dyn AnalysisGateway>,
        normalizer: Normalizer,
        campaign_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            normalizer,
            campaign_id: campaign_id.into(),
            timeout,
            url: UrlAdapter,
            document: DocumentAdapter,
            video: VideoAdapter,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn adapter_for(&self, kind: JobKind) -> &dyn SourceAdapter {
        match kind {
            JobKind::Url | JobKind::BatchUrl => &self.url,
            JobKind::File => &self.document,
            JobKind::Video => &self.video,
        }
    }

    /// Drives one pending job to a terminal state.
    ///
    /// Jobs that are not `pending` are left untouched. A job removed while
    /// its gateway call is outstanding is ignored once the call returns.
    pub async fn run(&self, job_id: &str) -> DriveOutcome {
        let Some(job) = self.store.get(job_id) else {
            log::debug!("Job {} no longer exists, skipping", job_id);
            return DriveOutcome::Ignored;
        };
        if job.status != JobStatus::Pending {
            log::debug!("Job {} is {}, not pending; ignoring", job_id, job.status);
            return DriveOutcome::Ignored;
        }

        let span = info_span!(
            "ingest",
            job_id = %job.id,
            kind = %job.kind,
            source = %redacted_label(&job.payload),
            attempt = job.attempts + 1,
        );
        self.drive(job.id, job.kind, job.payload)
            .instrument(span)
            .await
    }

    async fn drive(&self, id: String, kind: JobKind, payload: JobPayload) -> DriveOutcome {
        let adapter = self.adapter_for(kind);
        let plan = adapter.plan();

        let request = match adapter.prepare(&payload) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Job {} rejected by {} adapter: {}", id, adapter.name(), e);
                return self.fail(&id, e.to_string());
            }
        };

        if let Err(e) = self.store.apply(&id, JobUpdate::Start) {
            return ignored(&id, e);
        }
        log::info!("Job {} started ({})", id, kind);

        if let Err(e) = self.checkpoint(&id, plan, CheckpointName::Validated) {
            return ignored(&id, e);
        }
        if let Err(e) = self.checkpoint(&id, plan, CheckpointName::Submitted) {
            return ignored(&id, e);
        }

        let raw = match self
            .call_gateway(&request)
            .instrument(info_span!("gateway_call", operation = request.operation()))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Job {} failed: {}", id, e);
                return self.fail(&id, e.to_string());
            }
        };

        if let Err(e) = self.checkpoint(&id, plan, CheckpointName::Received) {
            return ignored(&id, e);
        }

        let record = info_span!("normalize")
            .in_scope(|| self.normalizer.normalize(&id, kind, &payload, &raw));

        if let Err(e) = self.checkpoint(&id, plan, CheckpointName::Normalized) {
            return ignored(&id, e);
        }
        match self.store.apply(&id, JobUpdate::Complete(record.clone())) {
            Ok(_) => {
                log::info!(
                    "Job {} completed: {} insights, confidence {:.2}",
                    id,
                    record.insight_count,
                    record.confidence_score
                );
                self.store
                    .events()
                    .send(PipelineEvent::IntelligenceReady(record));
                DriveOutcome::Completed
            }
            Err(e) => ignored(&id, e),
        }
    }

    async fn call_gateway(
        &self,
        request: &GatewayRequest,
    ) -> Result<crate::gateway::RawAnalysis, GatewayError> {
        let call = request.send(self.gateway.as_ref(), &self.campaign_id);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout.as_secs())),
        }
    }

    fn checkpoint(
        &self,
        id: &str,
        plan: CheckpointPlan,
        name: CheckpointName,
    ) -> Result<(), StoreError> {
        let checkpoint = plan.get(name);
        let _step =
            info_span!("checkpoint", step = %name, progress = checkpoint.progress).entered();
        self.store.apply(
            id,
            JobUpdate::Progress {
                progress: checkpoint.progress,
                message: checkpoint.message.to_string(),
            },
        )?;
        Ok(())
    }

    fn fail(&self, id: &str, reason: String) -> DriveOutcome {
        match self.store.apply(id, JobUpdate::Fail(reason)) {
            Ok(_) => DriveOutcome::Failed,
            Err(e) => ignored(id, e),
        }
    }
}

fn ignored(id: &str, e: StoreError) -> DriveOutcome {
    log::debug!("Discarding update for job {}: {}", id, e);
    DriveOutcome::Ignored
}

fn redacted_label(payload: &JobPayload) -> String {
    match payload {
        JobPayload::Url { url, .. } | JobPayload::Video { url } => sanitize::redact_url(url),
        JobPayload::Document(doc) => sanitize::redact_file_name(doc.file_name()),
    }
}
