//! Analysis Gateway: the external service that performs content analysis.
//!
//! The pipeline only consumes this interface. [`HttpGateway`] talks to the
//! hosted intelligence API; tests substitute scripted implementations.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::job::SourceDocument;

pub use http::HttpGateway;

/// Provider-shaped response body. Its layout depends on the operation and
/// is interpreted only by the normalizer.
pub type RawAnalysis = serde_json::Value;

/// Caller intent for a URL analysis.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    SalesPage,
    Website,
    Video,
    Social,
    Comprehensive,
    EnhancedSalesPage,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::SalesPage => "sales_page",
            AnalysisType::Website => "website",
            AnalysisType::Video => "video",
            AnalysisType::Social => "social",
            AnalysisType::Comprehensive => "comprehensive",
            AnalysisType::EnhancedSalesPage => "enhanced_sales_page",
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations offered by the analysis service.
///
/// Every call may fail with a transport error or a gateway-reported error;
/// both surface as [`GatewayError`].
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze_url(
        &self,
        url: &str,
        campaign_id: &str,
        analysis_type: AnalysisType,
    ) -> Result<RawAnalysis, GatewayError>;

    async fn analyze_video(
        &self,
        video_url: &str,
        campaign_id: &str,
    ) -> Result<RawAnalysis, GatewayError>;

    async fn upload_document(
        &self,
        document: &SourceDocument,
        campaign_id: &str,
    ) -> Result<RawAnalysis, GatewayError>;
}

/// A validated call, ready to be sent. Built by an adapter from a job
/// payload, so exactly one gateway operation runs per attempt.
#[derive(Debug, Clone)]
pub enum GatewayRequest {
    AnalyzeUrl {
        url: String,
        analysis_type: AnalysisType,
    },
    AnalyzeVideo {
        video_url: String,
    },
    UploadDocument(SourceDocument),
}

impl GatewayRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            GatewayRequest::AnalyzeUrl { .. } => "analyze-url",
            GatewayRequest::AnalyzeVideo { .. } => "analyze-video",
            GatewayRequest::UploadDocument(_) => "upload-document",
        }
    }

    pub async fn send(
        &self,
        gateway: &dyn AnalysisGateway,
        campaign_id: &str,
    ) -> Result<RawAnalysis, GatewayError> {
        match self {
            GatewayRequest::AnalyzeUrl { url, analysis_type } => {
                gateway.analyze_url(url, campaign_id, *analysis_type).await
            }
            GatewayRequest::AnalyzeVideo { video_url } => {
                gateway.analyze_video(video_url, campaign_id).await
            }
            GatewayRequest::UploadDocument(document) => {
                gateway.upload_document(document, campaign_id).await
            }
        }
    }
}
