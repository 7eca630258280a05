use crate::consult::RetryPolicy;
use crate::scan::ScanConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub scan: ScanConfig,
    pub max_fragment_size: usize,
    pub max_fragments: usize,
    pub retry: RetryPolicy,
    /// Bound on each provider attempt
    pub ai_timeout: Duration,
    /// When false, consultation is skipped and every Dockerfile uses a fallback template
    pub consult_ai: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            max_fragment_size: 16 * 1024,
            max_fragments: 8,
            retry: RetryPolicy::default(),
            ai_timeout: Duration::from_secs(60),
            consult_ai: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragment_limits(mut self, max_fragment_size: usize, max_fragments: usize) -> Self {
        self.max_fragment_size = max_fragment_size;
        self.max_fragments = max_fragments;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_ai_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = timeout;
        self
    }

    pub fn without_ai(mut self) -> Self {
        self.consult_ai = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_fragment_size, 16 * 1024);
        assert_eq!(config.max_fragments, 8);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.consult_ai);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_fragment_limits(2048, 2)
            .with_ai_timeout(Duration::from_secs(5))
            .without_ai();

        assert_eq!(config.max_fragment_size, 2048);
        assert_eq!(config.max_fragments, 2);
        assert_eq!(config.ai_timeout, Duration::from_secs(5));
        assert!(!config.consult_ai);
    }
}
