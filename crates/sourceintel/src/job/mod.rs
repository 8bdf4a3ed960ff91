pub mod checkpoint;
pub mod record;

pub use checkpoint::{Checkpoint, CheckpointName, CheckpointPlan, DOCUMENT_PLAN, URL_PLAN, VIDEO_PLAN};
pub use record::{JobKind, JobPayload, JobRecord, JobStatus, SourceDocument};
