//! Mapping request failures to user-facing categories and messages.

use crate::ai::GenerationError;
use crate::extract::ExtractionError;

const NETWORK_HINTS: &[&str] = &["network", "connect", "timed out", "dns", "unreachable"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Unauthorized,
    Forbidden,
    RateLimited,
    Server,
    Network,
    Unknown,
    Extraction,
}

/// Which flow a failure came from. Only changes the wording of generic
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Chat,
    PersonalizedTip,
    CategoryTips,
}

impl Flow {
    fn fallback_message(&self) -> &'static str {
        match self {
            Flow::Chat => "Sorry, something went wrong. Please try again.",
            Flow::PersonalizedTip => "Failed to generate personalized tip. Please try again.",
            Flow::CategoryTips => "Failed to generate tips. Please try again.",
        }
    }

    fn no_text_message(&self) -> &'static str {
        match self {
            Flow::Chat => "AI did not return a valid response.",
            Flow::PersonalizedTip => "AI did not return a valid tip.",
            Flow::CategoryTips => "AI did not return valid tips.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// Rejected locally, before any request.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The request was dropped or panicked before it committed a result.
    #[error("request interrupted before completion")]
    Interrupted,
}

fn is_network_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    NETWORK_HINTS.iter().any(|hint| lower.contains(hint))
}

impl FlowError {
    /// First match wins: validation, 401, 403, 429, 5xx, network, unknown,
    /// extraction. A 400 is not validation; only local rejections are.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FlowError::Validation(_) => ErrorCategory::Validation,
            FlowError::Generation(err) => match err {
                GenerationError::MissingApiKey
                | GenerationError::Status { status: 401, .. } => ErrorCategory::Unauthorized,
                GenerationError::Status { status: 403, .. } => ErrorCategory::Forbidden,
                GenerationError::Status { status: 429, .. } => ErrorCategory::RateLimited,
                GenerationError::Status { status, .. } if *status >= 500 => ErrorCategory::Server,
                GenerationError::Transport(message) if is_network_message(message) => {
                    ErrorCategory::Network
                }
                GenerationError::Status { .. } | GenerationError::Transport(_) => {
                    ErrorCategory::Unknown
                }
            },
            FlowError::Interrupted => ErrorCategory::Unknown,
            FlowError::Extraction(_) => ErrorCategory::Extraction,
        }
    }

    /// Short message for the error slot. Response bodies never leak into it.
    pub fn user_message(&self, flow: Flow) -> String {
        let message = match self {
            FlowError::Validation(message) => return message.clone(),
            FlowError::Generation(GenerationError::MissingApiKey) => {
                "API key not configured. Set GEMINI_API_KEY or add api_key to the config file."
            }
            FlowError::Generation(GenerationError::Status { status: 400, .. }) => {
                "Invalid request. Please check your message."
            }
            FlowError::Generation(GenerationError::Status { status, .. }) => match self.category() {
                ErrorCategory::Unauthorized => {
                    "API key is invalid. Please check your configuration."
                }
                ErrorCategory::Forbidden => "Access denied. Please check your API key permissions.",
                ErrorCategory::RateLimited => "Rate limit exceeded. Please try again later.",
                ErrorCategory::Server => "Server error. Please try again later.",
                _ => return format!("API Error: {status}"),
            },
            FlowError::Generation(GenerationError::Transport(_)) => match self.category() {
                ErrorCategory::Network => "Network error. Please check your connection.",
                _ => flow.fallback_message(),
            },
            FlowError::Interrupted => flow.fallback_message(),
            FlowError::Extraction(ExtractionError::NoBody) => {
                "No response from AI. Please try again."
            }
            FlowError::Extraction(ExtractionError::NoText) => flow.no_text_message(),
            FlowError::Extraction(ExtractionError::NoValidTips) => "No valid tips were generated.",
        };
        message.to_string()
    }
}
