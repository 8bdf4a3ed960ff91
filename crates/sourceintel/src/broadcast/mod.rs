//! Job state and the event stream callers observe it through.

pub mod events;
pub mod job_store;

pub use events::{EventBroadcaster, PipelineEvent, DEFAULT_EVENT_CAPACITY};
pub use job_store::{JobCounts, JobStore, JobUpdate};
