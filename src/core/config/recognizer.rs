//! Options controlling a [`crate::pipeline::Recognizer`].

use super::errors::{ConfigError, ConfigValidator};
use super::onnx::OrtSessionConfig;
use crate::core::constants::DEFAULT_PARALLEL_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Runtime options of the recognizer.
///
/// These are process-wide settings; per-type geometry and alphabets live in
/// the parameters file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Log raw predictions, sparse output and log-probabilities.
    #[serde(default)]
    pub debug: bool,
    /// Merge repeated classes during greedy decoding.
    #[serde(default = "default_merge_repeated")]
    pub merge_repeated: bool,
    /// Number of ONNX Runtime sessions created per loaded network.
    #[serde(default)]
    pub session_pool_size: Option<usize>,
    /// ONNX Runtime session options.
    #[serde(default)]
    pub ort_session: Option<OrtSessionConfig>,
    /// Batch size above which samples are decoded in parallel.
    #[serde(default)]
    pub parallel_threshold: Option<usize>,
}

fn default_merge_repeated() -> bool {
    true
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            merge_repeated: true,
            session_pool_size: None,
            ort_session: None,
            parallel_threshold: None,
        }
    }
}

impl RecognizerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables debug dumps.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enables or disables repeat merging.
    pub fn merge_repeated(mut self, merge_repeated: bool) -> Self {
        self.merge_repeated = merge_repeated;
        self
    }

    /// Sets the session pool size.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = Some(size);
        self
    }

    /// Sets the ONNX Runtime session options.
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_session = Some(config);
        self
    }

    /// Sets the parallel decoding threshold.
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = Some(threshold);
        self
    }

    /// Returns the effective parallel decoding threshold.
    pub fn effective_parallel_threshold(&self) -> usize {
        self.parallel_threshold.unwrap_or(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl ConfigValidator for RecognizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_pool_size == Some(0) {
            return Err(ConfigError::InvalidConfig {
                message: "session_pool_size must be greater than 0".to_string(),
            });
        }
        if let Some(ort) = &self.ort_session
            && (ort.intra_threads == Some(0) || ort.inter_threads == Some(0))
        {
            return Err(ConfigError::InvalidConfig {
                message: "thread counts must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecognizerConfig::new();
        assert!(config.merge_repeated);
        assert!(!config.debug);
        assert_eq!(
            config.effective_parallel_threshold(),
            DEFAULT_PARALLEL_THRESHOLD
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = RecognizerConfig::new().session_pool_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config =
            RecognizerConfig::new().ort_session(OrtSessionConfig::new().with_intra_threads(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: RecognizerConfig = serde_json::from_str(r#"{"debug": true}"#).unwrap();
        assert!(config.debug);
        assert!(config.merge_repeated);
    }
}
