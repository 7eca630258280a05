//! Generation result data structures

use crate::pipeline::Stage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Name the orchestration descriptor is written under
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
/// Path the optional CI definition is written under
pub const CI_FILE_PATH: &str = ".github/workflows/containers.yml";

/// Where a Dockerfile came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    Ai,
    Fallback,
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactSource::Ai => f.write_str("ai"),
            ArtifactSource::Fallback => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceArtifact {
    pub dockerfile_content: String,
    /// Repository-relative path, forward slashes
    pub dockerfile_path: String,
    /// Repository-relative build context, "." for the root
    pub context: String,
    pub source: ArtifactSource,
}

/// A recoverable problem recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub stage: Stage,
    pub message: String,
}

impl Warning {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub project_name: String,
    pub services: BTreeMap<String, ServiceArtifact>,
    pub compose_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_content: Option<String>,
    pub commands: Vec<String>,
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl GenerationResult {
    pub fn fallback_count(&self) -> usize {
        self.services
            .values()
            .filter(|a| a.source == ArtifactSource::Fallback)
            .count()
    }

    /// Every artifact in one markdown document
    pub fn to_markdown_bundle(&self) -> String {
        let mut out = format!("# {} container artifacts\n", self.project_name);

        for (name, artifact) in &self.services {
            out.push_str(&format!(
                "\n## {} ({}, {})\n\n```dockerfile\n{}\n```\n",
                name,
                artifact.dockerfile_path,
                artifact.source,
                artifact.dockerfile_content.trim_end()
            ));
        }

        out.push_str(&format!(
            "\n## {}\n\n```yaml\n{}\n```\n",
            COMPOSE_FILE_NAME,
            self.compose_content.trim_end()
        ));

        if let Some(ci) = &self.ci_content {
            out.push_str(&format!("\n## {}\n\n```yaml\n{}\n```\n", CI_FILE_PATH, ci.trim_end()));
        }

        if !self.commands.is_empty() {
            out.push_str(&format!("\n## Commands\n\n```\n{}\n```\n", self.commands.join("\n")));
        }

        if !self.notes.is_empty() {
            out.push_str("\n## Notes\n\n");
            for note in &self.notes {
                out.push_str(&format!("- {}\n", note));
            }
        }

        if !self.warnings.is_empty() {
            out.push_str("\n## Warnings\n\n");
            for warning in &self.warnings {
                out.push_str(&format!("- {}\n", warning));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> GenerationResult {
        let mut services = BTreeMap::new();
        services.insert(
            "api".to_string(),
            ServiceArtifact {
                dockerfile_content: "FROM node:20-alpine\n".to_string(),
                dockerfile_path: "api/Dockerfile".to_string(),
                context: "api".to_string(),
                source: ArtifactSource::Fallback,
            },
        );
        GenerationResult {
            project_name: "demo".to_string(),
            services,
            compose_content: "name: demo\n".to_string(),
            ci_content: None,
            commands: vec!["docker compose up -d".to_string()],
            warnings: vec![Warning::new(Stage::Generating, "api used the fallback template")],
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_markdown_bundle() {
        let bundle = result().to_markdown_bundle();
        assert!(bundle.starts_with("# demo container artifacts"));
        assert!(bundle.contains("## api (api/Dockerfile, fallback)"));
        assert!(bundle.contains("```yaml\nname: demo\n```"));
        assert!(bundle.contains("- [generating] api used the fallback template"));
        assert!(!bundle.contains(CI_FILE_PATH));
    }

    #[test]
    fn test_fallback_count() {
        assert_eq!(result().fallback_count(), 1);
    }

    #[test]
    fn test_json_serialization() {
        let json = serde_json::to_value(result()).unwrap();
        assert_eq!(json["services"]["api"]["source"], "fallback");
        assert_eq!(json["warnings"][0]["stage"], "generating");
        assert!(json.get("ci_content").is_none());
    }
}
