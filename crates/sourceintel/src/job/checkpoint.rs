//! Checkpoint tables for adapter progress staging.

use serde::Serialize;

/// Named progress milestone within one attempt.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointName {
    Validated,
    Submitted,
    Received,
    Normalized,
}

impl std::fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointName::Validated => write!(f, "Validated"),
            CheckpointName::Submitted => write!(f, "Submitted"),
            CheckpointName::Received => write!(f, "Received"),
            CheckpointName::Normalized => write!(f, "Normalized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub name: CheckpointName,
    pub progress: u8,
    pub message: &'static str,
}

impl Checkpoint {
    const fn new(name: CheckpointName, progress: u8, message: &'static str) -> Self {
        Self {
            name,
            progress,
            message,
        }
    }
}

/// Ordered checkpoints for one adapter. Progress values strictly increase
/// and the last one is always 100.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointPlan(&'static [Checkpoint; 4]);

impl CheckpointPlan {
    pub fn get(&self, name: CheckpointName) -> Checkpoint {
        let idx = match name {
            CheckpointName::Validated => 0,
            CheckpointName::Submitted => 1,
            CheckpointName::Received => 2,
            CheckpointName::Normalized => 3,
        };
        self.0[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.0.iter()
    }
}

pub const URL_PLAN: CheckpointPlan = CheckpointPlan(&[
    Checkpoint::new(CheckpointName::Validated, 10, "Validating URL..."),
    Checkpoint::new(CheckpointName::Submitted, 30, "Extracting content..."),
    Checkpoint::new(CheckpointName::Received, 70, "Processing intelligence..."),
    Checkpoint::new(CheckpointName::Normalized, 100, "Complete"),
]);

pub const DOCUMENT_PLAN: CheckpointPlan = CheckpointPlan(&[
    Checkpoint::new(CheckpointName::Validated, 20, "Uploading file..."),
    Checkpoint::new(CheckpointName::Submitted, 50, "Processing document..."),
    Checkpoint::new(CheckpointName::Received, 80, "Extracting intelligence..."),
    Checkpoint::new(CheckpointName::Normalized, 100, "Complete"),
]);

pub const VIDEO_PLAN: CheckpointPlan = CheckpointPlan(&[
    Checkpoint::new(CheckpointName::Validated, 15, "Validating video URL..."),
    Checkpoint::new(CheckpointName::Submitted, 40, "Extracting video content..."),
    Checkpoint::new(CheckpointName::Received, 75, "Processing intelligence..."),
    Checkpoint::new(CheckpointName::Normalized, 100, "Complete"),
]);
