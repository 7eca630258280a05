use super::state::Stage;
use crate::consult::AiError;
use crate::emit::CommandError;
use crate::generate::GenerationError;
use crate::graph::GraphError;
use crate::scan::ScanError;
use thiserror::Error;

/// Fatal cause of a failed run
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Analysis cancelled")]
    Cancelled,
}

/// A run that ended in `Failed`, with the stage it failed in
#[derive(Debug, Error)]
#[error("{stage} failed: {cause}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub cause: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, cause: impl Into<StageError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }

    pub fn cancelled(stage: Stage) -> Self {
        Self::new(stage, StageError::Cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, StageError::Cancelled)
    }

    /// Returns a user-friendly error message with troubleshooting hints
    pub fn help_message(&self) -> String {
        match &self.cause {
            StageError::Scan(ScanError::PathNotFound(path)) => format!(
                "Error: Repository path not found\nPath: {}\n\n\
                Help: The specified path does not exist. Please check:\n\
                - Is the path correct?\n\
                - Do you have permission to access it?",
                path.display()
            ),
            StageError::Scan(ScanError::NotADirectory(path)) => format!(
                "Error: Repository path is not a directory\nPath: {}\n\n\
                Help: Please provide the path to the repository root directory.",
                path.display()
            ),
            StageError::Scan(err) => format!("Error: {}\n\nHelp: Check the directory permissions.", err),
            StageError::Graph(GraphError::DuplicateService { name, first, second }) => format!(
                "Error: Two services are both named '{}'\n\
                - {}\n\
                - {}\n\n\
                Help: Service names come from directory paths. Rename one of the \
                directories or the manifest's package name.",
                name,
                first.display(),
                second.display()
            ),
            StageError::Ai(AiError::RateLimited { attempts, .. }) => format!(
                "Error: AI provider rate limit exceeded ({} attempts)\n\n\
                Help: Wait and retry, raise MONODOCK_MAX_ATTEMPTS, or run with --no-ai \
                to use the deterministic templates only.",
                attempts
            ),
            StageError::Ai(AiError::Unreachable { attempts, message }) => format!(
                "Error: AI provider unreachable after {} attempt(s)\n\n\
                Help: Check the endpoint (--endpoint / MONODOCK_API_BASE_URL) and that \
                the variable named by --credential-env holds a valid key. \
                Run with --no-ai to skip consultation.\n\n\
                Details: {}",
                attempts, message
            ),
            StageError::Ai(AiError::InvalidResponse { message, .. }) => format!(
                "Error: The AI answer did not match the expected schema\n\n\
                Help: Try a more capable model (--model), or run with --no-ai.\n\n\
                Details: {}",
                message
            ),
            StageError::Generation(err) => format!(
                "Error: {}\n\nHelp: This is a template defect; please report it.",
                err
            ),
            StageError::Command(err) => format!("Error: {}", err),
            StageError::Cancelled => format!("Analysis cancelled during {}", self.stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_includes_stage() {
        let err = PipelineError::new(
            Stage::BuildingGraph,
            GraphError::DuplicateService {
                name: "api".to_string(),
                first: PathBuf::from("a/package.json"),
                second: PathBuf::from("b/package.json"),
            },
        );
        assert!(err.to_string().starts_with("buildinggraph failed: Duplicate service name 'api'"));
        assert!(err.help_message().contains("a/package.json"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_help_messages() {
        let err = PipelineError::new(Stage::Scanning, ScanError::PathNotFound(PathBuf::from("/nope")));
        assert!(err.help_message().contains("/nope"));

        let err = PipelineError::new(
            Stage::Consulting,
            AiError::RateLimited {
                attempts: 3,
                retry_after: None,
            },
        );
        assert!(err.help_message().contains("3 attempts"));

        let err = PipelineError::cancelled(Stage::Consulting);
        assert!(err.is_cancelled());
        assert_eq!(err.help_message(), "Analysis cancelled during consulting");
    }
}
