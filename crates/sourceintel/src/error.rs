use std::path::PathBuf;
use thiserror::Error;

use crate::job::{JobKind, JobStatus};

#[derive(Error, Debug)]
pub enum SourceIntelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Pipeline requires a running tokio runtime")]
    NoRuntime,

    #[error("Batch {batch_id} aborted: {reason}")]
    BatchAborted { batch_id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse settings YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Settings validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Input rejected before a job reaches `processing`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("URL is empty")]
    EmptyUrl,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("Document has no file name")]
    MissingFileName,

    #[error("Document '{0}' is empty")]
    EmptyDocument(String),

    #[error("Payload cannot be ingested as a {0} job")]
    PayloadMismatch(JobKind),
}

/// Failure reported while talking to the analysis gateway.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),
}

/// Rejected store mutation. Callers treat these as no-ops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Job '{0}' not found")]
    NotFound(String),

    #[error("Illegal transition for job '{job_id}': {from} -> {to}")]
    IllegalTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
}

pub type Result<T> = std::result::Result<T, SourceIntelError>;
