pub mod adapter;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod gateway;
pub mod job;
pub mod normalizer;
pub mod pipeline;
pub mod sanitize;
pub mod scheduler;
pub mod secrets;
pub mod telemetry;

pub use adapter::{DriveOutcome, IngestionDriver, SourceAdapter};
pub use broadcast::{EventBroadcaster, JobCounts, JobStore, JobUpdate, PipelineEvent};
pub use config::{load_settings, Settings};
pub use error::{
    ConfigError, GatewayError, Result, SourceIntelError, StoreError, ValidationError,
};
pub use gateway::{AnalysisGateway, AnalysisType, HttpGateway, RawAnalysis};
pub use job::{JobKind, JobPayload, JobRecord, JobStatus, SourceDocument};
pub use normalizer::{IntelligenceRecord, Normalizer};
pub use pipeline::{BatchSubmission, Pipeline};
pub use scheduler::{BatchReport, BatchScheduler};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use telemetry::init_tracing;
