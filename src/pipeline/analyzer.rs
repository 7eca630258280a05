//! Pipeline orchestrator
//!
//! Drives one analysis through every stage, records warnings, reports
//! progress and honors the cancellation signal between manifests, between
//! stages and between provider attempts.

use super::cancel::CancellationSignal;
use super::config::PipelineConfig;
use super::error::{PipelineError, StageError};
use super::state::{PipelineState, Stage};
use crate::consult::{AiConsultant, AiSuggestion, ConsultError, PromptComposer, PromptFragment};
use crate::emit::{emit_commands, TargetOs};
use crate::generate::ArtifactGenerator;
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::llm::LLMClient;
use crate::output::{GenerationResult, Warning};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::scan::{ManifestScanner, ServiceCandidate};
use crate::stack::{resolve_siblings, sanitize_name, ServiceClassifier, ServiceDescriptor};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Analyzer {
    client: Option<Arc<dyn LLMClient>>,
    config: PipelineConfig,
    progress: Arc<dyn ProgressHandler>,
    cancel: CancellationSignal,
}

/// Per-run bookkeeping: current state, collected warnings, stage timing
struct Run<'a> {
    state: PipelineState,
    warnings: Vec<Warning>,
    stage_started: Instant,
    progress: &'a dyn ProgressHandler,
    cancel: &'a CancellationSignal,
}

impl<'a> Run<'a> {
    fn new(progress: &'a dyn ProgressHandler, cancel: &'a CancellationSignal) -> Self {
        progress.on_progress(&ProgressEvent::StateChanged {
            stage: Stage::Scanning,
        });
        Self {
            state: PipelineState::new(),
            warnings: Vec::new(),
            stage_started: Instant::now(),
            progress,
            cancel,
        }
    }

    fn stage(&self) -> Stage {
        self.state.stage().unwrap_or(Stage::Generating)
    }

    fn warn(&mut self, message: impl Into<String>) {
        let warning = Warning::new(self.stage(), message);
        self.progress.on_progress(&ProgressEvent::Warning {
            stage: warning.stage,
            message: warning.message.clone(),
        });
        self.warnings.push(warning);
    }

    fn checkpoint(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::cancelled(self.stage()));
        }
        Ok(())
    }

    fn fail(&self, cause: impl Into<StageError>) -> PipelineError {
        PipelineError::new(self.stage(), cause)
    }

    /// Closes the current stage and enters the next one
    fn advance(&mut self) -> Result<(), PipelineError> {
        let finished = self.stage();
        self.progress.on_progress(&ProgressEvent::StageCompleted {
            stage: finished,
            duration: self.stage_started.elapsed(),
        });
        self.checkpoint()?;
        if let Some(next) = self.state.advance() {
            debug!(from = %finished, to = %next, "Pipeline transition");
            self.stage_started = Instant::now();
            self.progress.on_progress(&ProgressEvent::StateChanged { stage: next });
        }
        Ok(())
    }
}

impl Analyzer {
    /// Analyzer without a provider; every Dockerfile comes from a fallback template
    pub fn offline() -> Self {
        Self {
            client: None,
            config: PipelineConfig::default().without_ai(),
            progress: Arc::new(NoOpHandler),
            cancel: CancellationSignal::new(),
        }
    }

    pub fn new(client: Arc<dyn LLMClient>, config: PipelineConfig) -> Self {
        Self {
            client: Some(client),
            config,
            progress: Arc::new(NoOpHandler),
            cancel: CancellationSignal::new(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage against `root` and returns the terminal state
    pub async fn run_to_state(&self, root: &Path, target: TargetOs) -> PipelineState {
        let started = Instant::now();
        self.progress.on_progress(&ProgressEvent::Started {
            repo_path: root.display().to_string(),
        });

        let mut run = Run::new(self.progress.as_ref(), &self.cancel);
        match self.execute(&mut run, root, target).await {
            Ok((result, resources)) => {
                self.progress.on_progress(&ProgressEvent::Completed {
                    services: result.services.len(),
                    resources,
                    total_time: started.elapsed(),
                });
                info!(
                    project = %result.project_name,
                    services = result.services.len(),
                    warnings = result.warnings.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Analysis completed"
                );
                run.state.finish(result);
            }
            Err(error) => {
                if error.is_cancelled() {
                    self.progress.on_progress(&ProgressEvent::Cancelled { stage: error.stage });
                    info!(stage = %error.stage, "Analysis cancelled");
                } else {
                    self.progress.on_progress(&ProgressEvent::Failed {
                        stage: error.stage,
                        error: error.to_string(),
                    });
                    warn!(stage = %error.stage, error = %error, "Analysis failed");
                }
                run.state.fail(error);
            }
        }
        run.state
    }

    /// Runs every stage against `root`
    pub async fn run(&self, root: &Path, target: TargetOs) -> Result<GenerationResult, PipelineError> {
        match self.run_to_state(root, target).await.into_result() {
            Some(result) => result,
            None => Err(PipelineError::cancelled(Stage::Scanning)),
        }
    }

    async fn execute(
        &self,
        run: &mut Run<'_>,
        root: &Path,
        target: TargetOs,
    ) -> Result<(GenerationResult, usize), PipelineError> {
        let (scan_root, candidates) = self.scan(run, root)?;
        run.advance()?;

        let services = self.classify(run, &scan_root, &candidates)?;
        run.advance()?;

        let project_name = scan_root
            .file_name()
            .map(|n| sanitize_name(&n.to_string_lossy()))
            .unwrap_or_else(|| "app".to_string());
        let graph = GraphBuilder::new()
            .build(project_name, services)
            .map_err(|e| run.fail(e))?;
        info!(
            services = graph.services.len(),
            resources = graph.external_resources.len(),
            "Dependency graph built"
        );
        run.advance()?;

        let fragments = self.compose(run, &graph);
        run.advance()?;

        let suggestion = self.consult(run, &graph, &fragments).await?;
        run.advance()?;

        let mut result = ArtifactGenerator::new()
            .generate(&graph, &suggestion)
            .map_err(|e| run.fail(e))?;
        result.commands = emit_commands(target, &result);
        run.checkpoint()?;

        let mut warnings = std::mem::take(&mut run.warnings);
        for warning in &result.warnings {
            run.progress.on_progress(&ProgressEvent::Warning {
                stage: warning.stage,
                message: warning.message.clone(),
            });
        }
        warnings.append(&mut result.warnings);
        result.warnings = warnings;

        run.progress.on_progress(&ProgressEvent::StageCompleted {
            stage: Stage::Generating,
            duration: run.stage_started.elapsed(),
        });
        Ok((result, graph.external_resources.len()))
    }

    fn scan(
        &self,
        run: &mut Run<'_>,
        root: &Path,
    ) -> Result<(std::path::PathBuf, Vec<ServiceCandidate>), PipelineError> {
        let scanner = ManifestScanner::new(root)
            .map_err(|e| run.fail(e))?
            .with_config(self.config.scan.clone());

        let mut candidates = Vec::new();
        for item in scanner.scan() {
            run.checkpoint()?;
            match item {
                Ok(candidate) => candidates.push(candidate),
                Err(skipped) => run.warn(skipped.to_string()),
            }
        }

        info!(manifests = candidates.len(), "Scan complete");
        Ok((scanner.root().to_path_buf(), candidates))
    }

    fn classify(
        &self,
        run: &mut Run<'_>,
        scan_root: &Path,
        candidates: &[ServiceCandidate],
    ) -> Result<Vec<ServiceDescriptor>, PipelineError> {
        let classifier = ServiceClassifier::new(scan_root);
        let mut descriptors = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            run.checkpoint()?;
            let Some(classification) = classifier.classify(candidate) else {
                debug!(
                    manifest = %candidate.manifest_path.display(),
                    "Manifest has no runtime signal, skipping"
                );
                continue;
            };
            if let Some(error) = &classification.error {
                run.warn(format!("{}: {}", candidate.manifest_path.display(), error));
            }
            run.progress.on_progress(&ProgressEvent::ServiceClassified {
                name: classification.descriptor.name.clone(),
                kind: classification.descriptor.kind.to_string(),
            });
            descriptors.push(classification.descriptor);
        }

        let (kept, messages) = resolve_siblings(descriptors);
        for message in messages {
            run.warn(message);
        }
        Ok(kept)
    }

    /// Fragments to send, or none when consultation is skipped
    fn compose(&self, run: &mut Run<'_>, graph: &DependencyGraph) -> Vec<PromptFragment> {
        if !self.config.consult_ai || self.client.is_none() {
            debug!("AI consultation disabled");
            return Vec::new();
        }
        if graph.is_empty() {
            debug!("No services detected, nothing to consult about");
            return Vec::new();
        }

        let composer = PromptComposer::new(self.config.max_fragment_size, self.config.max_fragments);
        match composer.compose(graph) {
            Ok(composition) => {
                if composition.is_summarized() {
                    run.warn(format!(
                        "Project description summarized ({}) to fit the prompt budget of {} bytes",
                        composition.level,
                        composer.budget()
                    ));
                }
                composition.fragments
            }
            Err(e) => {
                run.warn(format!("{}; skipping AI consultation", e));
                Vec::new()
            }
        }
    }

    async fn consult(
        &self,
        run: &mut Run<'_>,
        graph: &DependencyGraph,
        fragments: &[PromptFragment],
    ) -> Result<AiSuggestion, PipelineError> {
        let client = match &self.client {
            Some(client) if !fragments.is_empty() => Arc::clone(client),
            _ => return Ok(AiSuggestion::empty()),
        };

        let consultant = AiConsultant::new(client, self.config.retry, self.config.ai_timeout);
        match consultant
            .consult(&graph.project_name, fragments, run.cancel, run.progress)
            .await
        {
            Ok(suggestion) => Ok(suggestion),
            Err(ConsultError::Cancelled { attempts }) => {
                debug!(attempts, "Consultation cancelled");
                Err(PipelineError::cancelled(Stage::Consulting))
            }
            Err(ConsultError::Ai(e)) => Err(run.fail(e)),
        }
    }
}
