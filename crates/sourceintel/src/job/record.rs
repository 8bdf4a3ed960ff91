//! Job Record: one tracked unit of ingestion work.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gateway::AnalysisType;
use crate::normalizer::IntelligenceRecord;

/// Source kind of a job. Selects the adapter that drives it.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    Url,
    File,
    Video,
    BatchUrl,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Url => "url",
            JobKind::File => "file",
            JobKind::Video => "video",
            JobKind::BatchUrl => "batch-url",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Returns true for `completed` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// An uploaded document held in memory for the lifetime of its job.
///
/// The bytes are shared, so cloning a document (and therefore a job
/// snapshot) never copies the file contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    size: usize,
    #[serde(skip)]
    bytes: Arc<[u8]>,
}

impl SourceDocument {
    /// Creates a document, detecting the MIME type from the file name.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let file_name = file_name.into();
        let bytes: Arc<[u8]> = Arc::from(bytes.into());
        let mime_type = mime_guess::from_path(&file_name)
            .first()
            .map(|m| m.to_string());
        Self {
            size: bytes.len(),
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Overrides the detected MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Reads a document from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// The original submitted input, kept so a failed job can be retried.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobPayload {
    #[serde(rename_all = "camelCase")]
    Url {
        url: String,
        analysis_type: AnalysisType,
    },
    Document(SourceDocument),
    Video { url: String },
}

impl JobPayload {
    pub fn url(url: impl Into<String>, analysis_type: AnalysisType) -> Self {
        JobPayload::Url {
            url: url.into(),
            analysis_type,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        JobPayload::Video { url: url.into() }
    }

    pub fn document(document: SourceDocument) -> Self {
        JobPayload::Document(document)
    }

    /// Display name for the job: the URL or the file name.
    pub fn label(&self) -> &str {
        match self {
            JobPayload::Url { url, .. } | JobPayload::Video { url } => url,
            JobPayload::Document(doc) => doc.file_name(),
        }
    }

    /// Kind used when the payload is submitted on its own (not in a batch).
    pub fn default_kind(&self) -> JobKind {
        match self {
            JobPayload::Url { .. } => JobKind::Url,
            JobPayload::Document(_) => JobKind::File,
            JobPayload::Video { .. } => JobKind::Video,
        }
    }
}

/// A tracked ingestion job.
///
/// Instances handed out by the store are snapshots; mutation only happens
/// inside [`crate::broadcast::JobStore`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub kind: JobKind,
    pub label: String,
    pub status: JobStatus,
    pub progress: u8,
    pub payload: JobPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<IntelligenceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Name of the last checkpoint reached in the current attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of times the job has been retried.
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub(crate) fn new(kind: JobKind, payload: JobPayload) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            label: payload.label().to_string(),
            status: JobStatus::Pending,
            progress: 0,
            payload,
            result: None,
            error: None,
            message: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this job is finished (completed or error).
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}
