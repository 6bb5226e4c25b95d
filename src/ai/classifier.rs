use async_trait::async_trait;

/// External model that turns a prompt plus a document blob into free text.
///
/// No structured-output contract: callers must parse the text defensively.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        blob: &[u8],
        blob_mime_type: &str,
    ) -> Result<String, ClassifierError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("empty response")]
    EmptyResponse,
}
