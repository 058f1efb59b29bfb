pub mod gemini;

pub use gemini::{
    Candidate, CandidateContent, Content, GeminiClient, GenerationRequest, GenerationResponse,
    Part, ResponsePart, DEFAULT_BASE_URL, DEFAULT_MODEL,
};

use async_trait::async_trait;

/// Failure reported by a [`GenerationClient`] before any text is extracted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// No API key was configured, so nothing was sent.
    #[error("API key not configured")]
    MissingApiKey,

    /// The endpoint answered with a non-2xx status.
    #[error("API error {status}: {}", .body.as_deref().unwrap_or("Unknown error"))]
    Status { status: u16, body: Option<String> },

    /// The request never produced a status (connect, TLS, timeout, decode).
    #[error("{0}")]
    Transport(String),
}

/// A text-generation backend.
///
/// `Ok(None)` means the endpoint answered 2xx with an empty or unreadable
/// body. That is a degenerate response, not a transport failure.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate_content(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<GenerationResponse>, GenerationError>;
}
