//! Maps raw gateway responses onto one [`IntelligenceRecord`] shape.
//!
//! URL, document and video analyses come back with different field names.
//! Each kind has a small key table; the first key present wins. Anything
//! missing or malformed degrades to a default, so [`Normalizer::normalize`]
//! cannot fail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::NormalizerSettings;
use crate::gateway::RawAnalysis;
use crate::job::{JobKind, JobPayload};

/// Canonical result of a completed job.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceRecord {
    /// Id of the job that produced this record.
    pub source_id: String,
    pub kind: JobKind,
    pub confidence_score: f64,
    pub title: String,
    pub insight_count: u32,
    /// Ranked, best first, as returned by the gateway.
    pub suggestions: Vec<String>,
    pub opportunities: Vec<String>,
    /// Gateway-side id, used downstream to request generated content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub generated_at: DateTime<Utc>,
}

struct KeyTable {
    confidence: &'static [&'static str],
    title: &'static [&'static str],
    count: &'static [&'static str],
    suggestions: &'static [&'static str],
    opportunities: &'static [&'static str],
}

const URL_KEYS: KeyTable = KeyTable {
    confidence: &["confidence_score", "confidence"],
    title: &["source_title", "title"],
    count: &["insight_count", "insights_extracted"],
    suggestions: &["campaign_suggestions", "suggestions"],
    opportunities: &["competitive_opportunities", "opportunities"],
};

// Uploads report a single opportunity list that doubles as suggestions.
const DOCUMENT_KEYS: KeyTable = KeyTable {
    confidence: &["confidence_score", "confidence"],
    title: &["source_title", "title"],
    count: &["insights_extracted", "insight_count"],
    suggestions: &["campaign_suggestions", "content_opportunities", "suggestions"],
    opportunities: &["content_opportunities", "opportunities"],
};

const VIDEO_KEYS: KeyTable = KeyTable {
    confidence: &["confidence_score", "confidence"],
    title: &["source_title", "title", "video_title"],
    count: &["insights_extracted", "insight_count"],
    suggestions: &["campaign_suggestions", "content_suggestions", "suggestions"],
    opportunities: &["content_opportunities", "competitive_opportunities", "opportunities"],
};

const ID_KEYS: &[&str] = &["intelligence_id", "id"];

fn keys_for(kind: JobKind) -> &'static KeyTable {
    match kind {
        JobKind::Url | JobKind::BatchUrl => &URL_KEYS,
        JobKind::File => &DOCUMENT_KEYS,
        JobKind::Video => &VIDEO_KEYS,
    }
}

/// Total mapping from gateway output to [`IntelligenceRecord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    settings: NormalizerSettings,
}

impl Normalizer {
    pub fn new(settings: NormalizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NormalizerSettings {
        &self.settings
    }

    pub fn normalize(
        &self,
        source_id: &str,
        kind: JobKind,
        payload: &JobPayload,
        raw: &RawAnalysis,
    ) -> IntelligenceRecord {
        let keys = keys_for(kind);

        let suggestions = first_list(raw, keys.suggestions);
        let opportunities = first_list(raw, keys.opportunities);

        let insight_count = first(raw, keys.count)
            .and_then(as_count)
            .or_else(|| {
                [&suggestions, &opportunities]
                    .into_iter()
                    .find(|list| !list.is_empty())
                    .map(|list| list.len() as u32)
            })
            .unwrap_or(self.settings.insight_floor);

        let confidence_score = first(raw, keys.confidence)
            .and_then(as_confidence)
            .unwrap_or_else(|| fallback_confidence(self.settings.confidence_fallback));

        let title = first(raw, keys.title)
            .and_then(non_blank_str)
            .map(str::to_string)
            .unwrap_or_else(|| fallback_title(payload));

        let source_url = match payload {
            JobPayload::Url { url, .. } | JobPayload::Video { url } => Some(url.clone()),
            JobPayload::Document(_) => None,
        };

        IntelligenceRecord {
            source_id: source_id.to_string(),
            kind,
            confidence_score,
            title,
            insight_count,
            suggestions,
            opportunities,
            intelligence_id: first(raw, ID_KEYS).and_then(as_id),
            source_url,
            generated_at: Utc::now(),
        }
    }
}

fn first<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

/// First key holding an array, flattened to strings.
fn first_list(raw: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(flatten_entry).collect())
        .unwrap_or_default()
}

/// Strings pass through unchanged; `{"description": "text"}` becomes `text`.
/// Other objects fall back to `title`/`text`; anything else is dropped.
fn flatten_entry(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => ["description", "title", "text"]
            .iter()
            .find_map(|key| map.get(*key).and_then(non_blank_str))
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}

fn non_blank_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

fn fallback_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        NormalizerSettings::default().confidence_fallback
    }
}

fn as_confidence(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then(|| n.clamp(0.0, 1.0))
}

fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn fallback_title(payload: &JobPayload) -> String {
    match payload {
        JobPayload::Url { url, .. } => format!("Analysis: {}", host_of(url)),
        JobPayload::Video { url } => format!("Video Analysis: {}", host_of(url)),
        JobPayload::Document(doc) => doc.file_name().to_string(),
    }
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
