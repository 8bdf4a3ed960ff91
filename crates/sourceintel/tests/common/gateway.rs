//! Scripted analysis gateway.
//!
//! Replies are queued per target (URL or file name) and consumed in order.
//! Targets without a queued reply get the fallback, `Ok({})` unless set.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::Instant;

use sourceintel::{AnalysisGateway, AnalysisType, GatewayError, RawAnalysis, SourceDocument};

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(RawAnalysis),
    Err(GatewayError),
    /// Wait, then answer.
    After(Duration, Box<Reply>),
}

impl Reply {
    pub fn ok(raw: RawAnalysis) -> Self {
        Reply::Ok(raw)
    }

    pub fn transport(message: &str) -> Self {
        Reply::Err(GatewayError::Transport(message.to_string()))
    }

    pub fn rejected(status: u16, message: &str) -> Self {
        Reply::Err(GatewayError::Rejected {
            status: Some(status),
            message: message.to_string(),
        })
    }

    pub fn after(self, delay: Duration) -> Self {
        Reply::After(delay, Box::new(self))
    }
}

/// One observed gateway call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub target: String,
    pub campaign_id: String,
    pub analysis_type: Option<AnalysisType>,
    pub document_size: Option<usize>,
    pub started_at: Instant,
    pub finished_at: Option<Instant>,
}

pub struct ScriptedGateway {
    script: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Mutex<Reply>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            fallback: Mutex::new(Reply::Ok(json!({}))),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queues `reply` for the next call targeting `target`.
    pub fn on(&self, target: &str, reply: Reply) -> &Self {
        self.script
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn set_fallback(&self, reply: Reply) {
        *self.fallback.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, target: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.target == target)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, mut call: RecordedCall) -> Result<RawAnalysis, GatewayError> {
        let reply = self
            .script
            .lock()
            .unwrap()
            .get_mut(&call.target)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone());

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call.clone());
            calls.len() - 1
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let mut reply = reply;
        while let Reply::After(delay, inner) = reply {
            tokio::time::sleep(delay).await;
            reply = *inner;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        call.finished_at = Some(Instant::now());
        self.calls.lock().unwrap()[index] = call;

        match reply {
            Reply::Ok(raw) => Ok(raw),
            Reply::Err(e) => Err(e),
            Reply::After(..) => unreachable!(),
        }
    }

    fn record(
        operation: &'static str,
        target: &str,
        campaign_id: &str,
        analysis_type: Option<AnalysisType>,
        document_size: Option<usize>,
    ) -> RecordedCall {
        RecordedCall {
            operation,
            target: target.to_string(),
            campaign_id: campaign_id.to_string(),
            analysis_type,
            document_size,
            started_at: Instant::now(),
            finished_at: None,
        }
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedGateway {
    async fn analyze_url(
        &self,
        url: &str,
        campaign_id: &str,
        analysis_type: AnalysisType,
    ) -> Result<RawAnalysis, GatewayError> {
        let call = Self::record("analyze-url", url, campaign_id, Some(analysis_type), None);
        self.answer(call).await
    }

    async fn analyze_video(
        &self,
        video_url: &str,
        campaign_id: &str,
    ) -> Result<RawAnalysis, GatewayError> {
        let call = Self::record("analyze-video", video_url, campaign_id, None, None);
        self.answer(call).await
    }

    async fn upload_document(
        &self,
        document: &SourceDocument,
        campaign_id: &str,
    ) -> Result<RawAnalysis, GatewayError> {
        let call = Self::record(
            "upload-document",
            document.file_name(),
            campaign_id,
            None,
            Some(document.len()),
        );
        self.answer(call).await
    }
}
