use url::Url;

use super::SourceAdapter;
use crate::error::ValidationError;
use crate::gateway::GatewayRequest;
use crate::job::{CheckpointPlan, JobKind, JobPayload, URL_PLAN};

/// Parses `raw` as an absolute `http`/`https` URL with a host.
pub fn parse_web_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| ValidationError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::UnsupportedScheme {
                scheme: other.to_string(),
            })
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl {
            url: trimmed.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Web pages, single or batched.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlAdapter;

impl SourceAdapter for UrlAdapter {
    fn name(&self) -> &'static str {
        "url"
    }

    fn plan(&self) -> CheckpointPlan {
        URL_PLAN
    }

    fn prepare(&self, payload: &JobPayload) -> Result<GatewayRequest, ValidationError> {
        let JobPayload::Url { url, analysis_type } = payload else {
            return Err(ValidationError::PayloadMismatch(JobKind::Url));
        };
        parse_web_url(url)?;
        // The trimmed original is sent, not the parser's normalized form.
        Ok(GatewayRequest::AnalyzeUrl {
            url: url.trim().to_string(),
            analysis_type: *analysis_type,
        })
    }
}
