//! Artifact generation
//!
//! Merges the validated AI suggestion with deterministic templates. The
//! orchestration descriptor is always synthesized from the graph; AI
//! Dockerfiles are taken verbatim when well-formed.

mod compose;
pub mod dockerfile;
mod template;

pub use compose::render_compose;
pub use dockerfile::{fallback_dockerfile, is_well_formed};

use crate::consult::AiSuggestion;
use crate::graph::DependencyGraph;
use crate::output::{ArtifactSource, GenerationResult, ServiceArtifact, Warning};
use crate::pipeline::Stage;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Template '{template}' has an unresolved placeholder '{placeholder}'")]
    UnresolvedPlaceholder { template: String, placeholder: String },

    #[error("Failed to serialize {what}: {message}")]
    Serialization { what: String, message: String },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactGenerator;

impl ArtifactGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Builds every artifact for the graph; output depends only on the inputs
    ///
    /// `commands` is left empty for the emitter to fill.
    pub fn generate(
        &self,
        graph: &DependencyGraph,
        suggestion: &AiSuggestion,
    ) -> Result<GenerationResult, GenerationError> {
        let mut warnings = Vec::new();
        let mut services = BTreeMap::new();

        for service in &graph.services {
            let context = service.context_path();
            let dockerfile_path = if context == "." {
                "Dockerfile".to_string()
            } else {
                format!("{}/Dockerfile", context)
            };

            let (content, source) = match suggestion.dockerfile_for(&service.name) {
                Some(content) if is_well_formed(content) => {
                    debug!(service = %service.name, "Using AI Dockerfile");
                    (content.to_string(), ArtifactSource::Ai)
                }
                Some(_) => {
                    warnings.push(Warning::new(
                        Stage::Generating,
                        format!(
                            "AI Dockerfile for '{}' is malformed (no FROM instruction); using fallback template",
                            service.name
                        ),
                    ));
                    (fallback_dockerfile(service)?, ArtifactSource::Fallback)
                }
                None => {
                    warnings.push(Warning::new(
                        Stage::Generating,
                        format!("No AI Dockerfile for '{}'; using fallback template", service.name),
                    ));
                    (fallback_dockerfile(service)?, ArtifactSource::Fallback)
                }
            };

            services.insert(
                service.name.clone(),
                ServiceArtifact {
                    dockerfile_content: content,
                    dockerfile_path,
                    context,
                    source,
                },
            );
        }

        for name in suggestion.services.keys() {
            if graph.service(name).is_none() {
                warnings.push(Warning::new(
                    Stage::Generating,
                    format!("AI answer mentions unknown service '{}'; ignored", name),
                ));
            }
        }

        let ci_content = match suggestion.ci.as_deref() {
            Some(ci) => match serde_yaml::from_str::<serde_yaml::Value>(ci) {
                Ok(serde_yaml::Value::Mapping(_)) => Some(ci.to_string()),
                _ => {
                    warnings.push(Warning::new(
                        Stage::Generating,
                        "AI CI definition is not a YAML mapping; omitted",
                    ));
                    None
                }
            },
            None => None,
        };

        let compose_content = render_compose(graph)?;

        let result = GenerationResult {
            project_name: graph.project_name.clone(),
            services,
            compose_content,
            ci_content,
            commands: Vec::new(),
            warnings,
            notes: suggestion.notes.clone(),
        };

        if result.fallback_count() > 0 {
            warn!(
                fallbacks = result.fallback_count(),
                services = result.services.len(),
                "Some Dockerfiles use fallback templates"
            );
        }
        info!(
            services = result.services.len(),
            resources = graph.external_resources.len(),
            ci = result.ci_content.is_some(),
            "Artifacts generated"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consult::ServiceSuggestion;
    use crate::graph::GraphBuilder;
    use crate::stack::{Dependency, Ecosystem, PackageManager, RuntimeHints, ServiceDescriptor, ServiceKind};
    use std::path::PathBuf;

    fn svc(name: &str, root: &str, deps: &[&str]) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.to_string(),
            kind: ServiceKind::ApiBackend,
            port: Some(8000),
            dependencies: deps.iter().map(|d| Dependency::new(*d, None)).collect(),
            declared_datastores: Default::default(),
            relative_root: PathBuf::from(root),
            manifest_path: PathBuf::from(root).join("requirements.txt"),
            ecosystem: Ecosystem::Python,
            package_manager: PackageManager::Pip,
            framework: Some("fastapi".to_string()),
            hints: RuntimeHints::default(),
        }
    }

    fn graph() -> DependencyGraph {
        GraphBuilder::new()
            .build(
                "demo",
                vec![svc("api", "services/api", &["redis"]), svc("jobs", "services/jobs", &["redis"])],
            )
            .unwrap()
    }

    fn suggestion(pairs: &[(&str, &str)]) -> AiSuggestion {
        let mut s = AiSuggestion::empty();
        for (name, dockerfile) in pairs {
            s.services.insert(
                name.to_string(),
                ServiceSuggestion {
                    dockerfile: dockerfile.to_string(),
                },
            );
        }
        s
    }

    #[test]
    fn test_empty_suggestion_uses_fallbacks() {
        let result = ArtifactGenerator::new().generate(&graph(), &AiSuggestion::empty()).unwrap();
        assert_eq!(result.services.len(), 2);
        assert_eq!(result.fallback_count(), 2);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.services["api"].dockerfile_path, "services/api/Dockerfile");
        assert!(result.commands.is_empty());
        let compose: serde_yaml::Value = serde_yaml::from_str(&result.compose_content).unwrap();
        assert!(compose["services"].get("redis").is_some());
    }

    #[test]
    fn test_partial_answer() {
        let s = suggestion(&[("api", "FROM python:3.12\nCMD [\"python\", \"app.py\"]\n")]);
        let result = ArtifactGenerator::new().generate(&graph(), &s).unwrap();

        assert_eq!(result.services["api"].source, ArtifactSource::Ai);
        assert_eq!(result.services["api"].dockerfile_content, "FROM python:3.12\nCMD [\"python\", \"app.py\"]\n");
        assert_eq!(result.services["jobs"].source, ArtifactSource::Fallback);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("'jobs'"));
        assert_eq!(result.warnings[0].stage, Stage::Generating);
    }

    #[test]
    fn test_malformed_and_unknown() {
        let s = suggestion(&[("api", "RUN echo nope"), ("ghost", "FROM alpine")]);
        let result = ArtifactGenerator::new().generate(&graph(), &s).unwrap();
        assert_eq!(result.services["api"].source, ArtifactSource::Fallback);
        assert!(result.warnings.iter().any(|w| w.message.contains("malformed")));
        assert!(result.warnings.iter().any(|w| w.message.contains("'ghost'")));
        assert!(!result.services.contains_key("ghost"));
    }

    #[test]
    fn test_ci_must_be_mapping() {
        let mut s = AiSuggestion::empty();
        s.ci = Some("on: push\njobs: {}\n".to_string());
        let result = ArtifactGenerator::new().generate(&graph(), &s).unwrap();
        assert!(result.ci_content.is_some());

        s.ci = Some("- just\n- a list\n".to_string());
        let result = ArtifactGenerator::new().generate(&graph(), &s).unwrap();
        assert!(result.ci_content.is_none());
        assert!(result.warnings.iter().any(|w| w.message.contains("CI")));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let s = suggestion(&[("api", "FROM python:3.12\n")]);
        let first = ArtifactGenerator::new().generate(&graph(), &s).unwrap();
        let second = ArtifactGenerator::new().generate(&graph(), &s).unwrap();
        assert_eq!(first, second);
    }
}
