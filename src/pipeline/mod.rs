//! Analysis pipeline
//!
//! `Scanning → Classifying → BuildingGraph → Composing → Consulting →
//! Generating → Done | Failed`, one shot per run.

mod analyzer;
mod cancel;
pub mod config;
mod error;
mod state;

pub use analyzer::Analyzer;
pub use cancel::CancellationSignal;
pub use config::PipelineConfig;
pub use error::{PipelineError, StageError};
pub use state::{PipelineState, Stage};
