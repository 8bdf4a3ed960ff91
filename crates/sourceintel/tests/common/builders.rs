//! Builder for test settings.

#![allow(dead_code)]

use sourceintel::config::Settings;

pub const TEST_CAMPAIGN: &str = "campaign-test";

pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Defaults for tests: the production delay and timeout, a fixed
    /// campaign id.
    pub fn new() -> Self {
        Self {
            settings: Settings::for_campaign(TEST_CAMPAIGN),
        }
    }

    pub fn campaign(mut self, campaign_id: &str) -> Self {
        self.settings.campaign_id = campaign_id.to_string();
        self
    }

    pub fn batch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.settings.batch.delay_ms = delay_ms;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.settings.gateway.timeout_secs = secs;
        self
    }

    pub fn confidence_fallback(mut self, value: f64) -> Self {
        self.settings.normalizer.confidence_fallback = value;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}
