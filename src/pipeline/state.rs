//! Pipeline stages and the run state machine

use super::error::PipelineError;
use crate::output::GenerationResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Working stage of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scanning,
    Classifying,
    BuildingGraph,
    Composing,
    Consulting,
    Generating,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Scanning,
        Stage::Classifying,
        Stage::BuildingGraph,
        Stage::Composing,
        Stage::Consulting,
        Stage::Generating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scanning => "scanning",
            Stage::Classifying => "classifying",
            Stage::BuildingGraph => "buildinggraph",
            Stage::Composing => "composing",
            Stage::Consulting => "consulting",
            Stage::Generating => "generating",
        }
    }

    /// The stage after this one; `None` after generation
    pub fn next(&self) -> Option<Stage> {
        let index = Stage::ALL.iter().position(|s| s == self)?;
        Stage::ALL.get(index + 1).copied()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot run state: a stage in progress, or a terminal outcome
#[derive(Debug)]
pub enum PipelineState {
    Running(Stage),
    Done(Box<GenerationResult>),
    Failed(Box<PipelineError>),
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Running(Stage::Scanning)
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Running(stage) => Some(*stage),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineState::Running(_))
    }

    /// Moves to the next stage; returns the new stage
    ///
    /// Terminal states and the last stage do not advance.
    pub fn advance(&mut self) -> Option<Stage> {
        let next = self.stage()?.next()?;
        *self = PipelineState::Running(next);
        Some(next)
    }

    /// Completes the run; only valid while generating
    pub fn finish(&mut self, result: GenerationResult) -> bool {
        if self.stage() != Some(Stage::Generating) {
            return false;
        }
        *self = PipelineState::Done(Box::new(result));
        true
    }

    /// Fails the run from any non-terminal state
    pub fn fail(&mut self, error: PipelineError) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = PipelineState::Failed(Box::new(error));
        true
    }

    pub fn into_result(self) -> Option<Result<GenerationResult, PipelineError>> {
        match self {
            PipelineState::Running(_) => None,
            PipelineState::Done(result) => Some(Ok(*result)),
            PipelineState::Failed(error) => Some(Err(*error)),
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Running(stage) => write!(f, "{}", stage),
            PipelineState::Done(_) => f.write_str("done"),
            PipelineState::Failed(error) => write!(f, "failed ({})", error.stage),
        }
    }
}
