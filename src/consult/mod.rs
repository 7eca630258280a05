//! AI consultation
//!
//! Prompt composition, the retrying consultant and validation of the
//! provider's answer.

mod consultant;
pub mod prompt;
pub mod response;
mod suggestion;

pub use consultant::{AiConsultant, RetryPolicy};
pub use prompt::{system_prompt, Composition, PromptComposer, PromptError, PromptFragment, SummaryLevel};
pub use response::{extract_json_from_response, parse_suggestion, ResponseError, WireService, WireSuggestion};
pub use suggestion::{AiSuggestion, ServiceSuggestion};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("AI provider unreachable after {attempts} attempt(s): {message}")]
    Unreachable { attempts: u32, message: String },

    #[error("AI provider rate limit still exceeded after {attempts} attempt(s)")]
    RateLimited {
        attempts: u32,
        retry_after: Option<Duration>,
    },

    #[error("AI response rejected: {message}")]
    InvalidResponse {
        message: String,
        raw_response: String,
    },
}

impl AiError {
    /// Attempts made before giving up; validation failures stop after one
    pub fn attempts(&self) -> u32 {
        match self {
            AiError::Unreachable { attempts, .. } | AiError::RateLimited { attempts, .. } => *attempts,
            AiError::InvalidResponse { .. } => 1,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsultError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("Consultation cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}
