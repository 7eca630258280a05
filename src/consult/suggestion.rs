use serde::Serialize;
use std::collections::BTreeMap;

/// Per-service advice from the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSuggestion {
    pub dockerfile: String,
}

/// Validated provider answer
///
/// Services missing from `services` were not covered by the answer and fall
/// back to the deterministic templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AiSuggestion {
    pub services: BTreeMap<String, ServiceSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl AiSuggestion {
    /// Suggestion used when consultation is skipped
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn dockerfile_for(&self, service: &str) -> Option<&str> {
        self.services.get(service).map(|s| s.dockerfile.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.ci.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_suggestion() {
        let suggestion = AiSuggestion::empty();
        assert!(suggestion.is_empty());
        assert!(suggestion.dockerfile_for("api").is_none());
    }

    #[test]
    fn test_dockerfile_for() {
        let mut suggestion = AiSuggestion::empty();
        suggestion.services.insert(
            "api".to_string(),
            ServiceSuggestion {
                dockerfile: "FROM node:20".to_string(),
            },
        );
        assert_eq!(suggestion.dockerfile_for("api"), Some("FROM node:20"));
        assert!(!suggestion.is_empty());
    }
}
