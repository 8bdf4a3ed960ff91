//! Pipeline events streamed to callers.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::job::JobRecord;
use crate::normalizer::IntelligenceRecord;
use crate::scheduler::BatchReport;

/// Default broadcast channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PipelineEvent {
    /// Full store contents, in submission order, after any job changed.
    JobsChanged(Vec<JobRecord>),
    /// A job just completed with this record.
    IntelligenceReady(IntelligenceRecord),
    /// Every item of a batch reached a terminal state (or was skipped).
    BatchCompleted(BatchReport),
}

/// Fans pipeline events out to any number of subscribers.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Arc<broadcast::Sender<PipelineEvent>>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: PipelineEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Receivers that fall more than `capacity` events behind observe
    /// `RecvError::Lagged` and resume from the oldest retained event.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
