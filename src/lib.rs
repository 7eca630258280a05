//! monodock - container artifacts for every service in a repository
//!
//! Scans a repository for project manifests, classifies each service,
//! infers the external resources it needs (databases, caches, queues),
//! optionally consults a generative-AI provider and produces one Dockerfile
//! per service, a docker-compose file and the commands to build and run
//! them.
//!
//! # Pipeline
//!
//! - [`scan`]: manifest discovery
//! - [`stack`]: manifest parsing and service classification
//! - [`graph`]: resource inference and the service graph
//! - [`consult`]: prompt composition and AI consultation
//! - [`generate`]: Dockerfile and compose generation
//! - [`emit`]: platform-specific commands
//! - [`pipeline`]: the state machine driving one run
//!
//! # Example
//!
//! ```no_run
//! use monodock::{analyze, TargetOs};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = analyze(Path::new("/path/to/repo"), TargetOs::Posix, None).await?;
//! for (name, artifact) in &result.services {
//!     println!("{}: {}", name, artifact.dockerfile_path);
//! }
//! println!("{}", result.compose_content);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod consult;
pub mod emit;
pub mod generate;
pub mod graph;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scan;
pub mod stack;
pub mod util;

pub use config::{AiConfig, ConfigError, MonodockConfig};
pub use consult::{AiError, AiSuggestion};
pub use emit::{emit_commands, CommandError, TargetOs};
pub use generate::{ArtifactGenerator, GenerationError};
pub use graph::{DependencyGraph, GraphError, ResourceDescriptor};
pub use llm::{BackendError, GenAIClient, LLMClient, Provider};
pub use output::{ArtifactSource, GenerationResult, ServiceArtifact, Warning};
pub use pipeline::{Analyzer, CancellationSignal, PipelineConfig, PipelineError, PipelineState, Stage};
pub use scan::{ManifestScanner, ScanError, ServiceCandidate};
pub use stack::{ServiceDescriptor, ServiceKind};
pub use util::{init_from_env, init_logging, LoggingConfig};

use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Analyzes `root` and generates every artifact
///
/// With `ai_config` set, a [`GenAIClient`] is built for this call only; with
/// `None` consultation is skipped and every Dockerfile comes from a fallback
/// template.
pub async fn analyze(
    root: &Path,
    target_os: TargetOs,
    ai_config: Option<&AiConfig>,
) -> Result<GenerationResult, PipelineError> {
    let analyzer = match ai_config {
        Some(ai_config) => Analyzer::new(ai_config.create_client(), ai_config.pipeline_config()),
        None => Analyzer::offline(),
    };
    analyzer.run(root, target_os).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_monodock() {
        assert_eq!(NAME, "monodock");
    }
}
