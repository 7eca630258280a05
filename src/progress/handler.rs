//! Progress handler trait and events

use crate::pipeline::Stage;
use std::time::Duration;

/// Events emitted while a repository is analyzed
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Analysis started
    Started { repo_path: String },

    /// The pipeline entered a stage
    StateChanged { stage: Stage },

    /// A stage finished
    StageCompleted { stage: Stage, duration: Duration },

    /// A service was classified
    ServiceClassified { name: String, kind: String },

    /// A recoverable problem was recorded
    Warning { stage: Stage, message: String },

    /// Request sent to the completion provider
    AiRequestStarted {
        attempt: u32,
        fragments: usize,
        prompt_bytes: usize,
    },

    /// Response received from the completion provider
    AiResponseReceived {
        attempt: u32,
        response_time: Duration,
    },

    /// A failed attempt will be retried after `delay`
    RetryScheduled {
        attempt: u32,
        delay: Duration,
        reason: String,
    },

    /// Analysis completed successfully
    Completed {
        services: usize,
        resources: usize,
        total_time: Duration,
    },

    /// Analysis failed
    Failed { stage: Stage, error: String },

    /// Analysis was cancelled
    Cancelled { stage: Stage },
}

/// Trait for handling progress events during analysis
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::Started {
            repo_path: "/test".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            repo_path: "/test".to_string(),
        });
        handler.on_progress(&ProgressEvent::StateChanged {
            stage: Stage::Scanning,
        });
        handler.on_progress(&ProgressEvent::Completed {
            services: 2,
            resources: 1,
            total_time: Duration::from_secs(1),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::AiRequestStarted {
            attempt: 1,
            fragments: 2,
            prompt_bytes: 100,
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("AiRequestStarted"));
        assert!(debug_str.contains("attempt: 1"));
    }
}
