use super::url::parse_web_url;
use super::SourceAdapter;
use crate::error::ValidationError;
use crate::gateway::GatewayRequest;
use crate::job::{CheckpointPlan, JobKind, JobPayload, VIDEO_PLAN};

/// Video links (YouTube, Vimeo, hosted VSLs). Any web URL is accepted;
/// the gateway decides whether it can extract content from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoAdapter;

impl SourceAdapter for VideoAdapter {
    fn name(&self) -> &'static str {
        "video"
    }

    fn plan(&self) -> CheckpointPlan {
        VIDEO_PLAN
    }

    fn prepare(&self, payload: &JobPayload) -> Result<GatewayRequest, ValidationError> {
        let JobPayload::Video { url } = payload else {
            return Err(ValidationError::PayloadMismatch(JobKind::Video));
        };
        parse_web_url(url)?;
        Ok(GatewayRequest::AnalyzeVideo {
            video_url: url.trim().to_string(),
        })
    }
}
