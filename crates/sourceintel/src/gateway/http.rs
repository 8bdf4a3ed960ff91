//! HTTP client for the hosted intelligence API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{AnalysisGateway, AnalysisType, RawAnalysis};
use crate::config::GatewaySettings;
use crate::error::GatewayError;
use crate::job::SourceDocument;
use crate::sanitize;

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Added to the job timeout for reqwest's own request timeout, so a slow
/// gateway is reported as a job timeout rather than a network error.
const TRANSPORT_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Longest gateway error text copied into a job's error message.
const MAX_ERROR_MESSAGE_LENGTH: usize = 200;

/// Analysis type sent with video requests.
const VIDEO_ANALYSIS_TYPE: &str = "video_content";

#[derive(Serialize)]
struct AnalyzeUrlBody<'a> {
    url: &'a str,
    campaign_id: &'a str,
    analysis_type: &'a str,
}

#[derive(Serialize)]
struct AnalyzeVideoBody<'a> {
    video_url: &'a str,
    campaign_id: &'a str,
    analysis_type: &'a str,
}

/// Gateway backed by the `/api/intelligence/*` REST endpoints.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpGateway {
    /// Creates a gateway for `base_url`, sending `token` as a bearer token
    /// when present.
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Creates a gateway from settings, resolving the token source.
    pub fn from_settings(settings: &GatewaySettings) -> crate::error::Result<Self> {
        let token = crate::secrets::resolve_secret_optional(
            settings.token.as_deref(),
            settings.token_file.as_deref(),
            settings.token_env_var.as_deref(),
        )?;
        Ok(Self::new(&settings.base_url, token, transport_timeout(settings))?)
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/api/intelligence/{}", self.base_url, operation)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<RawAnalysis, GatewayError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.without_url().to_string()))?;

        read_response(response, fallback).await
    }
}

fn transport_timeout(settings: &GatewaySettings) -> Duration {
    settings.timeout() + TRANSPORT_TIMEOUT_MARGIN
}

async fn read_response(response: Response, fallback: &str) -> Result<RawAnalysis, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Rejected {
            status: Some(status.as_u16()),
            message: extract_error_message(&body, fallback),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| GatewayError::Transport(e.without_url().to_string()))?;
    Ok(parse_success_body(&body))
}

/// Success bodies that are not JSON count as an empty analysis.
fn parse_success_body(body: &str) -> RawAnalysis {
    serde_json::from_str(body).unwrap_or_else(|e| {
        debug!("Gateway returned a non-JSON success body: {}", e);
        RawAnalysis::Object(Default::default())
    })
}

/// Pulls the human-readable reason out of an error body.
///
/// Understands `{"detail": "..."}`, FastAPI validation lists
/// (`{"detail": [{"msg": "..."}]}`), `{"message": "..."}` and
/// `{"error": "..."}`. Anything else yields `fallback`.
pub(crate) fn extract_error_message(body: &str, fallback: &str) -> String {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return fallback.to_string(),
    };

    let message = match parsed.get("detail") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
    .or_else(|| {
        ["message", "error"]
            .iter()
            .find_map(|key| parsed.get(*key).and_then(|v| v.as_str()).map(str::to_string))
    });

    match message {
        Some(m) if !m.trim().is_empty() => truncate(m.trim()),
        _ => fallback.to_string(),
    }
}

fn truncate(message: &str) -> String {
    if message.chars().count() > MAX_ERROR_MESSAGE_LENGTH {
        let cut: String = message.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
        format!("{}...", cut)
    } else {
        message.to_string()
    }
}

#[async_trait]
impl AnalysisGateway for HttpGateway {
    async fn analyze_url(
        &self,
        url: &str,
        campaign_id: &str,
        analysis_type: AnalysisType,
    ) -> Result<RawAnalysis, GatewayError> {
        debug!(
            "POST analyze-url {} ({})",
            sanitize::redact_url(url),
            analysis_type
        );
        let body = AnalyzeUrlBody {
            url,
            campaign_id,
            analysis_type: analysis_type.as_str(),
        };
        let request = self.client.post(self.endpoint("analyze-url")).json(&body);
        self.send(request, "Analysis failed").await
    }

    async fn analyze_video(
        &self,
        video_url: &str,
        campaign_id: &str,
    ) -> Result<RawAnalysis, GatewayError> {
        debug!("POST analyze-video {}", sanitize::redact_url(video_url));
        let body = AnalyzeVideoBody {
            video_url,
            campaign_id,
            analysis_type: VIDEO_ANALYSIS_TYPE,
        };
        let request = self.client.post(self.endpoint("analyze-video")).json(&body);
        self.send(request, "Video analysis failed").await
    }

    async fn upload_document(
        &self,
        document: &SourceDocument,
        campaign_id: &str,
    ) -> Result<RawAnalysis, GatewayError> {
        debug!(
            "POST upload-document {} ({} bytes)",
            sanitize::redact_file_name(document.file_name()),
            document.len()
        );
        let mut part =
            Part::bytes(document.bytes().to_vec()).file_name(document.file_name().to_string());
        if let Some(mime) = document.mime_type() {
            part = part
                .mime_str(mime)
                .map_err(|e| GatewayError::Transport(format!("Invalid MIME type: {}", e)))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("campaign_id", campaign_id.to_string());

        let request = self
            .client
            .post(self.endpoint("upload-document"))
            .multipart(form);
        self.send(request, "File processing failed").await
    }
}
