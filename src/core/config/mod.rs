//! Configuration management for the recognition pipeline.
//!
//! This module provides the parameters file reader, the recognizer and
//! ONNX Runtime options, and the validation traits shared by them.

pub mod errors;
pub mod onnx;
pub mod params;
pub mod recognizer;

// Re-export commonly used types
pub use errors::{ConfigError, ConfigValidator, ConfigValidatorExt};
pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
pub use params::{ClassList, ModelParams, ParamsFile, unescape_symbols};
pub use recognizer::RecognizerConfig;
