//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { repo_path } => {
                info!(repo = %repo_path, "Starting analysis");
            }
            ProgressEvent::StateChanged { stage } => {
                info!(stage = %stage, "Entering stage");
            }
            ProgressEvent::StageCompleted { stage, duration } => {
                debug!(
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::ServiceClassified { name, kind } => {
                info!(service = %name, kind = %kind, "Classified service");
            }
            ProgressEvent::Warning { stage, message } => {
                warn!(stage = %stage, "{}", message);
            }
            ProgressEvent::AiRequestStarted {
                attempt,
                fragments,
                prompt_bytes,
            } => {
                debug!(attempt, fragments, prompt_bytes, "Sending request to provider");
            }
            ProgressEvent::AiResponseReceived {
                attempt,
                response_time,
            } => {
                debug!(
                    attempt,
                    response_time_ms = response_time.as_millis(),
                    "Received provider response"
                );
            }
            ProgressEvent::RetryScheduled {
                attempt,
                delay,
                reason,
            } => {
                warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    reason = %reason,
                    "Provider request failed, retrying"
                );
            }
            ProgressEvent::Completed {
                services,
                resources,
                total_time,
            } => {
                info!(
                    services,
                    resources,
                    total_time_ms = total_time.as_millis(),
                    "Analysis complete"
                );
            }
            ProgressEvent::Failed { stage, error } => {
                warn!(stage = %stage, error = %error, "Analysis failed");
            }
            ProgressEvent::Cancelled { stage } => {
                info!(stage = %stage, "Analysis cancelled");
            }
        }
    }
}
