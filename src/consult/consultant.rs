use super::prompt::{system_prompt, PromptFragment};
use super::response::parse_suggestion;
use super::suggestion::AiSuggestion;
use super::{AiError, ConsultError};
use crate::llm::{BackendError, ChatMessage, LLMClient, LLMRequest};
use crate::pipeline::CancellationSignal;
use crate::progress::{ProgressEvent, ProgressHandler};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 8192;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Failure of one attempt that is worth retrying
enum Transient {
    Unreachable(String),
    RateLimited(Option<Duration>),
}

pub struct AiConsultant {
    client: Arc<dyn LLMClient>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl AiConsultant {
    pub fn new(client: Arc<dyn LLMClient>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            client,
            policy,
            timeout,
        }
    }

    fn build_request(project_name: &str, fragments: &[PromptFragment]) -> LLMRequest {
        let total = fragments.len();
        let mut messages = Vec::with_capacity(total + 1);
        messages.push(ChatMessage::system(system_prompt(project_name)));
        messages.extend(fragments.iter().map(|fragment| {
            ChatMessage::user(format!(
                "[part {}/{}]\n{}",
                fragment.index + 1,
                total,
                fragment.text
            ))
        }));
        LLMRequest::new(messages)
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS)
    }

    /// Sends the fragments and validates the answer
    ///
    /// Transport failures and rate limits are retried per the policy. An
    /// answer that fails validation is returned immediately.
    pub async fn consult(
        &self,
        project_name: &str,
        fragments: &[PromptFragment],
        cancel: &CancellationSignal,
        progress: &dyn ProgressHandler,
    ) -> Result<AiSuggestion, ConsultError> {
        let request = Self::build_request(project_name, fragments);
        let prompt_bytes = request.content_len();

        info!(
            provider = self.client.name(),
            model = ?self.client.model_info(),
            fragments = fragments.len(),
            prompt_bytes,
            "Consulting AI provider"
        );

        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(ConsultError::Cancelled { attempts: attempt });
            }
            attempt += 1;

            progress.on_progress(&ProgressEvent::AiRequestStarted {
                attempt,
                fragments: fragments.len(),
                prompt_bytes,
            });

            let started = Instant::now();
            let outcome = tokio::select! {
                result = tokio::time::timeout(self.timeout, self.client.chat(request.clone())) => result,
                _ = cancel.cancelled() => return Err(ConsultError::Cancelled { attempts: attempt }),
            };

            let failure = match outcome {
                Err(_) => Transient::Unreachable(format!(
                    "request timed out after {}ms",
                    self.timeout.as_millis()
                )),
                Ok(Ok(response)) => {
                    progress.on_progress(&ProgressEvent::AiResponseReceived {
                        attempt,
                        response_time: started.elapsed(),
                    });
                    return parse_suggestion(&response.content)
                        .map(|suggestion| {
                            debug!(
                                services = suggestion.services.len(),
                                has_ci = suggestion.ci.is_some(),
                                "AI suggestion accepted"
                            );
                            suggestion
                        })
                        .map_err(|e| {
                            warn!(error = %e, "AI response failed validation");
                            ConsultError::Ai(AiError::InvalidResponse {
                                message: e.to_string(),
                                raw_response: response.content.clone(),
                            })
                        });
                }
                Ok(Err(BackendError::RateLimitError { retry_after })) => {
                    Transient::RateLimited(retry_after.map(Duration::from_secs))
                }
                Ok(Err(BackendError::InvalidResponse {
                    message,
                    raw_response,
                })) => {
                    return Err(ConsultError::Ai(AiError::InvalidResponse {
                        message,
                        raw_response: raw_response.unwrap_or_default(),
                    }));
                }
                Ok(Err(e)) if !e.is_transient() => {
                    return Err(ConsultError::Ai(AiError::Unreachable {
                        attempts: attempt,
                        message: e.to_string(),
                    }));
                }
                Ok(Err(e)) => Transient::Unreachable(e.to_string()),
            };

            if cancel.is_cancelled() {
                return Err(ConsultError::Cancelled { attempts: attempt });
            }

            if attempt >= self.policy.max_attempts {
                let error = match failure {
                    Transient::Unreachable(message) => AiError::Unreachable {
                        attempts: attempt,
                        message,
                    },
                    Transient::RateLimited(retry_after) => AiError::RateLimited {
                        attempts: attempt,
                        retry_after,
                    },
                };
                warn!(attempts = attempt, error = %error, "AI consultation failed");
                return Err(ConsultError::Ai(error));
            }

            let (delay, reason) = match failure {
                Transient::Unreachable(message) => (self.policy.delay_for(attempt), message),
                Transient::RateLimited(retry_after) => (
                    retry_after
                        .unwrap_or_else(|| self.policy.delay_for(attempt))
                        .min(self.policy.max_delay),
                    "rate limited".to_string(),
                ),
            };
            progress.on_progress(&ProgressEvent::RetryScheduled {
                attempt,
                delay,
                reason,
            });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(ConsultError::Cancelled { attempts: attempt }),
            }
        }
    }
}
