//! Configuration management for monodock
//!
//! Settings are loaded from environment variables with defaults and then
//! overridden by command-line flags.
//!
//! # Environment Variables
//!
//! - `MONODOCK_PROVIDER`: ollama|openai|claude|gemini|groq - default: "ollama"
//! - `MONODOCK_MODEL`: model name - default: the provider's default model
//! - `MONODOCK_API_BASE_URL`: replaces the provider's base URL
//! - `MONODOCK_CREDENTIAL_ENV`: name of the variable holding the API key -
//!   default: the provider's conventional variable (`OPENAI_API_KEY`, ...)
//! - `MONODOCK_REQUEST_TIMEOUT`: per-attempt timeout in seconds - default: "60"
//! - `MONODOCK_MAX_FRAGMENT_SIZE`: prompt fragment size in bytes - default: "16384"
//! - `MONODOCK_MAX_FRAGMENTS`: prompt fragment count - default: "8"
//! - `MONODOCK_MAX_ATTEMPTS`: provider attempts - default: "3"
//! - `MONODOCK_LOG_LEVEL`: trace|debug|info|warn|error - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use monodock::MonodockConfig;
//!
//! let config = MonodockConfig::default();
//! config.validate().expect("Invalid configuration");
//! let ai_config = config.to_ai_config();
//! ```

use crate::consult::RetryPolicy;
use crate::llm::{GenAIClient, LLMClient, Provider};
use crate::pipeline::PipelineConfig;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_FRAGMENT_SIZE: usize = 16 * 1024;
const DEFAULT_MAX_FRAGMENTS: usize = 8;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, claude, gemini, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Provider settings for one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub provider: Provider,
    pub model: String,
    /// Base URL override; the provider default when `None`
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    pub credential_ref: Option<String>,
    pub max_fragment_size: usize,
    pub max_fragments: usize,
    /// Bound on each attempt
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl AiConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            endpoint: None,
            credential_ref: None,
            max_fragment_size: DEFAULT_MAX_FRAGMENT_SIZE,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Builds the production client; the credential is resolved per request
    pub fn create_client(&self) -> Arc<dyn LLMClient> {
        Arc::new(GenAIClient::new(
            self.provider,
            self.model.clone(),
            self.endpoint.clone(),
            self.credential_ref.clone(),
        ))
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_fragment_limits(self.max_fragment_size, self.max_fragments)
            .with_ai_timeout(self.timeout)
            .with_retry(RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            })
    }
}

/// Effective configuration: environment variables over defaults
#[derive(Debug, Clone)]
pub struct MonodockConfig {
    pub provider: Provider,
    pub model: String,
    pub api_base_url: Option<String>,
    pub credential_env: Option<String>,
    pub request_timeout_secs: u64,
    pub max_fragment_size: usize,
    pub max_fragments: usize,
    pub max_attempts: u32,
    pub log_level: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for MonodockConfig {
    fn default() -> Self {
        let provider = env::var("MONODOCK_PROVIDER")
            .ok()
            .and_then(|s| s.parse::<Provider>().ok())
            .unwrap_or(Provider::Ollama);

        let model = env_non_empty("MONODOCK_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let log_level = env::var("MONODOCK_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider,
            model,
            api_base_url: env_non_empty("MONODOCK_API_BASE_URL"),
            credential_env: env_non_empty("MONODOCK_CREDENTIAL_ENV"),
            request_timeout_secs: env_parse("MONODOCK_REQUEST_TIMEOUT").unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_fragment_size: env_parse("MONODOCK_MAX_FRAGMENT_SIZE").unwrap_or(DEFAULT_MAX_FRAGMENT_SIZE),
            max_fragments: env_parse("MONODOCK_MAX_FRAGMENTS").unwrap_or(DEFAULT_MAX_FRAGMENTS),
            max_attempts: env_parse("MONODOCK_MAX_ATTEMPTS").unwrap_or(DEFAULT_MAX_ATTEMPTS),
            log_level,
        }
    }
}

impl MonodockConfig {
    /// Checks numeric ranges and the log level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be between 1 second and 10 minutes".to_string(),
            ));
        }
        if self.max_fragment_size < 256 || self.max_fragment_size > 1_048_576 {
            return Err(ConfigError::ValidationFailed(
                "Max fragment size must be between 256 bytes and 1MB".to_string(),
            ));
        }
        if self.max_fragments == 0 || self.max_fragments > 64 {
            return Err(ConfigError::ValidationFailed(
                "Max fragments must be between 1 and 64".to_string(),
            ));
        }
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(ConfigError::ValidationFailed(
                "Max attempts must be between 1 and 10".to_string(),
            ));
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }
        Ok(())
    }

    /// Variable the API key is read from; `None` for keyless providers
    pub fn effective_credential_env(&self) -> Option<String> {
        self.credential_env
            .clone()
            .or_else(|| self.provider.default_credential_env().map(str::to_string))
    }

    pub fn to_ai_config(&self) -> AiConfig {
        AiConfig {
            provider: self.provider,
            model: self.model.clone(),
            endpoint: self.api_base_url.clone(),
            credential_ref: self.credential_env.clone(),
            max_fragment_size: self.max_fragment_size,
            max_fragments: self.max_fragments,
            timeout: Duration::from_secs(self.request_timeout_secs),
            max_attempts: self.max_attempts,
        }
    }

    /// Key/value rendering for json and yaml output; never includes the key itself
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("provider".to_string(), self.provider.to_string());
        map.insert("model".to_string(), self.model.clone());
        if let Some(url) = &self.api_base_url {
            map.insert("api_base_url".to_string(), url.clone());
        }
        if let Some(var) = self.effective_credential_env() {
            map.insert("credential_env".to_string(), var);
        }
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("max_fragment_size".to_string(), self.max_fragment_size.to_string());
        map.insert("max_fragments".to_string(), self.max_fragments.to_string());
        map.insert("max_attempts".to_string(), self.max_attempts.to_string());
        map.insert("log_level".to_string(), self.log_level.clone());
        map
    }
}

impl fmt::Display for MonodockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Monodock Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        if let Some(url) = &self.api_base_url {
            writeln!(f, "  API Base URL: {}", url)?;
        }
        match self.effective_credential_env() {
            Some(var) => {
                let state = if env::var(&var).is_ok() { "set" } else { "not set" };
                writeln!(f, "  Credential Env: {} ({})", var, state)?;
            }
            None => writeln!(f, "  Credential Env: none")?,
        }
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Max Fragment Size: {} bytes", self.max_fragment_size)?;
        writeln!(f, "  Max Fragments: {}", self.max_fragments)?;
        writeln!(f, "  Max Attempts: {}", self.max_attempts)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
