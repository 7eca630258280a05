//! Provider answer validation
//!
//! The answer must be a single JSON object matching [`WireSuggestion`]
//! exactly; unknown fields are rejected. A markdown code fence around the
//! object is tolerated.

use super::suggestion::{AiSuggestion, ServiceSuggestion};
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("No JSON object found in response")]
    NoJson,

    #[error("Response does not match the expected schema: {0}")]
    Schema(String),

    #[error("Service entry {index} has an empty name")]
    EmptyServiceName { index: usize },

    #[error("Service '{0}' appears more than once")]
    DuplicateService(String),
}

/// Answer format requested from the provider
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WireSuggestion {
    /// One entry per service that gets a Dockerfile
    pub services: Vec<WireService>,
    /// Optional CI pipeline definition as a YAML document
    #[serde(default)]
    pub ci: Option<String>,
    /// Free-form remarks for the operator
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WireService {
    /// Service name exactly as given in the project description
    pub name: String,
    /// Complete Dockerfile content
    pub dockerfile: String,
}

/// JSON schema of [`WireSuggestion`], pretty-printed
pub fn answer_schema() -> String {
    let schema = schemars::schema_for!(WireSuggestion);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").expect("fence regex is valid")
    })
}

/// Extracts the JSON object from a raw completion
pub fn extract_json_from_response(response: &str) -> Result<&str, ResponseError> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed);
    }

    if let Some(captures) = fence_regex().captures(trimmed) {
        if let Some(json) = captures.get(1) {
            let json = json.as_str().trim();
            if json.starts_with('{') && json.ends_with('}') {
                return Ok(json);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return Ok(&trimmed[start..=end]);
        }
    }

    Err(ResponseError::NoJson)
}

pub fn parse_suggestion(response: &str) -> Result<AiSuggestion, ResponseError> {
    let json = extract_json_from_response(response)?;
    let wire: WireSuggestion =
        serde_json::from_str(json).map_err(|e| ResponseError::Schema(e.to_string()))?;

    let mut services = BTreeMap::new();
    for (index, service) in wire.services.into_iter().enumerate() {
        let name = service.name.trim().to_string();
        if name.is_empty() {
            return Err(ResponseError::EmptyServiceName { index });
        }
        if services.contains_key(&name) {
            return Err(ResponseError::DuplicateService(name));
        }
        services.insert(
            name,
            ServiceSuggestion {
                dockerfile: service.dockerfile,
            },
        );
    }

    Ok(AiSuggestion {
        services,
        ci: wire.ci.filter(|ci| !ci.trim().is_empty()),
        notes: wire.notes,
    })
}
