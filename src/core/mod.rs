//! The core module of the recognition pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Tensor aliases
//! - Cancellation
//! - Configuration management
//! - Constants used throughout the pipeline
//! - Error handling
//! - Inference engine integration

pub mod batch;
pub mod cancel;
pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;

pub use crate::utils::{init_tracing, load_image};
pub use batch::{Tensor2D, Tensor3D, Tensor4D, TensorD};
pub use cancel::CancellationFlag;
pub use config::{ConfigError, ConfigValidator, ModelParams, ParamsFile, RecognizerConfig};
pub use constants::*;
pub use errors::{OCRError, OcrResult, ProcessingStage};
pub use inference::{ModelLoader, OrtInfer, OrtModelLoader, SequenceModel};
