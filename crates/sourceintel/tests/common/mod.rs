//! Shared test utilities for sourceintel integration tests.
//!
//! This module provides:
//! - `ScriptedGateway`, an in-process gateway with per-target replies
//! - `SettingsBuilder` for compact settings setup
//! - `TestHarness` wiring both into a `Pipeline` with wait helpers

pub mod builders;
pub mod gateway;
pub mod harness;

pub use builders::*;
pub use gateway::{RecordedCall, Reply, ScriptedGateway};
pub use harness::TestHarness;
