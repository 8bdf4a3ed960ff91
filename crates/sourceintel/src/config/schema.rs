use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gateway::AnalysisType;

pub const SETTINGS_VERSION: &str = "1.0";

/// Confidence assigned when the gateway reports none.
pub const DEFAULT_CONFIDENCE_FALLBACK: f64 = 0.8;

/// Insight count assigned when nothing countable was returned.
pub const DEFAULT_INSIGHT_FLOOR: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: String,
    /// Campaign every submitted source is analyzed for.
    #[serde(default)]
    pub campaign_id: String,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub normalizer: NormalizerSettings,
    #[serde(default)]
    pub events: EventSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_version() -> String {
    SETTINGS_VERSION.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            campaign_id: String::new(),
            gateway: GatewaySettings::default(),
            batch: BatchSettings::default(),
            normalizer: NormalizerSettings::default(),
            events: EventSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Default settings bound to a campaign.
    pub fn for_campaign(campaign_id: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on a single gateway call before the job is failed.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_file: Option<String>,
    #[serde(default)]
    pub token_env_var: Option<String>,
    /// Analysis type used for batch submissions.
    #[serde(default)]
    pub default_analysis_type: AnalysisType,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    45
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
            token_file: None,
            token_env_var: None,
            default_analysis_type: AnalysisType::default(),
        }
    }
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSettings {
    /// Pause between one batch item finishing and the next being submitted.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    500
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

impl BatchSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizerSettings {
    #[serde(default = "default_confidence_fallback")]
    pub confidence_fallback: f64,
    #[serde(default = "default_insight_floor")]
    pub insight_floor: u32,
}

fn default_confidence_fallback() -> f64 {
    DEFAULT_CONFIDENCE_FALLBACK
}

fn default_insight_floor() -> u32 {
    DEFAULT_INSIGHT_FLOOR
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            confidence_fallback: DEFAULT_CONFIDENCE_FALLBACK,
            insight_floor: DEFAULT_INSIGHT_FLOOR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSettings {
    /// Broadcast channel capacity; slow subscribers past this lag.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    256
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}
