//! GenAI-based LLM client implementation
//!
//! Uses the `genai` crate for a unified interface across Ollama, OpenAI,
//! Claude, Gemini and Groq. The endpoint and the credential variable are
//! explicit; nothing is read from process-wide configuration besides the
//! named credential variable itself.

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error};

/// Completion provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Claude,
    Gemini,
    Groq,
}

impl Provider {
    pub fn adapter_kind(&self) -> AdapterKind {
        match self {
            Provider::Ollama => AdapterKind::Ollama,
            Provider::OpenAI => AdapterKind::OpenAI,
            Provider::Claude => AdapterKind::Anthropic,
            Provider::Gemini => AdapterKind::Gemini,
            Provider::Groq => AdapterKind::Groq,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Ollama => "qwen2.5-coder:7b",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Claude => "claude-sonnet-4-5",
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Groq => "llama-3.3-70b-versatile",
        }
    }

    /// Variable the provider's API key is read from unless overridden
    pub fn default_credential_env(&self) -> Option<&'static str> {
        self.adapter_kind().default_key_env_name()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            "claude" | "anthropic" => Ok(Provider::Claude),
            "gemini" => Ok(Provider::Gemini),
            "groq" => Ok(Provider::Groq),
            other => Err(format!(
                "Invalid provider: {}. Valid options: ollama, openai, claude, gemini, groq",
                other
            )),
        }
    }
}

/// GenAI-based LLM client
pub struct GenAIClient {
    client: Client,
    model: String,
    provider: Provider,
    endpoint: Option<String>,
}

impl GenAIClient {
    /// Creates a client for `provider`
    ///
    /// `endpoint` replaces the provider's default base URL. `credential_env`
    /// names the environment variable holding the API key; the provider's
    /// conventional variable is used when it is `None`.
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        endpoint: Option<String>,
        credential_env: Option<String>,
    ) -> Self {
        let model = model.into();
        let adapter = provider.adapter_kind();
        let resolver_model = model.clone();
        let resolver_endpoint = endpoint.clone();

        let resolver = ServiceTargetResolver::from_resolver_fn(
            move |service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                let endpoint = match &resolver_endpoint {
                    Some(url) => Endpoint::from_owned(url.clone()),
                    None => service_target.endpoint,
                };
                let auth = match (&credential_env, adapter.default_key_env_name()) {
                    (Some(var), _) => AuthData::from_env(var.clone()),
                    (None, Some(var)) => AuthData::from_env(var),
                    (None, None) => AuthData::from_single(""),
                };
                Ok(ServiceTarget {
                    endpoint,
                    auth,
                    model: ModelIden::new(adapter, &resolver_model),
                })
            },
        );

        let client = Client::builder()
            .with_service_target_resolver(resolver)
            .build();

        debug!(
            provider = %provider,
            model = %model,
            endpoint = ?endpoint,
            "Creating GenAI client"
        );

        Self {
            client,
            model,
            provider,
            endpoint,
        }
    }

    fn convert_message(msg: &ChatMessage) -> GenAIChatMessage {
        match msg.role {
            MessageRole::System => GenAIChatMessage::system(&msg.content),
            MessageRole::User => GenAIChatMessage::user(&msg.content),
            MessageRole::Assistant => GenAIChatMessage::assistant(&msg.content),
        }
    }
}

/// Maps a provider error message onto the transport taxonomy
pub(crate) fn classify_error(provider: Provider, message: &str) -> BackendError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        BackendError::RateLimitError { retry_after: None }
    } else if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("api key")
    {
        BackendError::AuthenticationError {
            message: message.to_string(),
        }
    } else if lower.contains("connect") || lower.contains("dns") || lower.contains("timed out") {
        BackendError::NetworkError {
            message: message.to_string(),
        }
    } else {
        BackendError::ApiError {
            message: format!("{} request failed: {}", provider, message),
            status_code: None,
        }
    }
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let start = std::time::Instant::now();

        let messages: Vec<GenAIChatMessage> =
            request.messages.iter().map(Self::convert_message).collect();
        let genai_request = GenAIChatRequest::new(messages);

        let mut options = ChatOptions::default();
        if let Some(temp) = request.temperature {
            options = options.with_temperature(temp as f64);
        }
        if let Some(max_tokens) = request.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }

        let response = self
            .client
            .exec_chat(&self.model, genai_request, Some(&options))
            .await
            .map_err(|e| {
                error!("{} API error: {}", self.provider, e);
                classify_error(self.provider, &e.to_string())
            })?;

        let content = response.first_text().unwrap_or_default().to_string();
        if content.trim().is_empty() {
            return Err(BackendError::InvalidResponse {
                message: "empty completion".to_string(),
                raw_response: Some(content),
            });
        }

        Ok(LLMResponse::text(content, start.elapsed()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genai_client_creation() {
        let client = GenAIClient::new(
            Provider::Ollama,
            "qwen2.5-coder:7b",
            Some("http://localhost:11434".to_string()),
            None,
        );

        assert_eq!(client.name(), "ollama");
        assert_eq!(client.model_info(), Some("qwen2.5-coder:7b".to_string()));
        assert!(format!("{:?}", client).contains("localhost:11434"));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Claude".parse::<Provider>().unwrap(), Provider::Claude);
        assert_eq!("anthropic".parse::<Provider>().unwrap(), Provider::Claude);
        assert!("grok".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_credential_env() {
        assert_eq!(Provider::OpenAI.default_credential_env(), Some("OPENAI_API_KEY"));
        assert_eq!(Provider::Claude.default_credential_env(), Some("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_classify_error() {
        assert!(matches!(
            classify_error(Provider::OpenAI, "HTTP 429 Too Many Requests"),
            BackendError::RateLimitError { .. }
        ));
        assert!(matches!(
            classify_error(Provider::OpenAI, "status 401 Unauthorized"),
            BackendError::AuthenticationError { .. }
        ));
        assert!(matches!(
            classify_error(Provider::Ollama, "error trying to connect: Connection refused"),
            BackendError::NetworkError { .. }
        ));
        assert!(matches!(
            classify_error(Provider::Gemini, "model not found"),
            BackendError::ApiError { .. }
        ));
    }
}
