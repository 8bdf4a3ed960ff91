use super::SourceAdapter;
use crate::error::ValidationError;
use crate::gateway::GatewayRequest;
use crate::job::{CheckpointPlan, JobKind, JobPayload, DOCUMENT_PLAN};

/// Uploaded documents (PDF, DOCX, TXT, ...). Format support is the
/// gateway's concern; only an obviously unusable upload is rejected here.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAdapter;

impl SourceAdapter for DocumentAdapter {
    fn name(&self) -> &'static str {
        "document"
    }

    fn plan(&self) -> CheckpointPlan {
        DOCUMENT_PLAN
    }

    fn prepare(&self, payload: &JobPayload) -> Result<GatewayRequest, ValidationError> {
        let JobPayload::Document(document) = payload else {
            return Err(ValidationError::PayloadMismatch(JobKind::File));
        };
        if document.file_name().trim().is_empty() {
            return Err(ValidationError::MissingFileName);
        }
        if document.is_empty() {
            return Err(ValidationError::EmptyDocument(
                document.file_name().to_string(),
            ));
        }
        Ok(GatewayRequest::UploadDocument(document.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SourceDocument;

    #[test]
    fn test_prepare_document() {
        let payload = JobPayload::document(SourceDocument::new("brief.pdf", b"%PDF".to_vec()));
        match DocumentAdapter.prepare(&payload).unwrap() {
            GatewayRequest::UploadDocument(doc) => assert_eq!(doc.file_name(), "brief.pdf"),
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_prepare_rejects_empty_and_nameless() {
        let empty = JobPayload::document(SourceDocument::new("empty.txt", Vec::new()));
        assert_eq!(
            DocumentAdapter.prepare(&empty).unwrap_err(),
            ValidationError::EmptyDocument("empty.txt".to_string())
        );

        let nameless = JobPayload::document(SourceDocument::new("  ", vec![1u8]));
        assert_eq!(
            DocumentAdapter.prepare(&nameless).unwrap_err(),
            ValidationError::MissingFileName
        );
    }
}
