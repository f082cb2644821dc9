//! Error types for the recognition pipeline.
//!
//! This module defines the errors that can occur while recognizing text,
//! from configuration lookup and image loading through network loading,
//! inference and CTC decoding. It also provides helper constructors that
//! attach context to the underlying errors.

use std::path::Path;
use thiserror::Error;

/// Enum representing the stages of a single recognition run.
///
/// Used to tag inference and cancellation errors with the stage they
/// interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Catalog lookup for the requested type.
    Resolve,
    /// Image loading and letterboxing.
    Preprocess,
    /// Weight manifest and shard loading.
    ModelLoad,
    /// Forward pass through the network.
    Inference,
    /// Greedy CTC decoding.
    Decode,
    /// Mapping class indices to text.
    LabelMapping,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Resolve => write!(f, "resolve"),
            ProcessingStage::Preprocess => write!(f, "preprocess"),
            ProcessingStage::ModelLoad => write!(f, "model load"),
            ProcessingStage::Inference => write!(f, "inference"),
            ProcessingStage::Decode => write!(f, "decode"),
            ProcessingStage::LabelMapping => write!(f, "label mapping"),
        }
    }
}

/// Enum representing every error the recognition pipeline can report.
///
/// No variant carries partial output: a run either produces the full text
/// or fails with one of these.
#[derive(Error, Debug)]
pub enum OCRError {
    /// Missing or malformed configuration entry.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// The requested type has no catalog entry.
    #[error("unknown type '{type_name}' (known types: {known})")]
    UnknownType {
        /// The type name that was requested.
        type_name: String,
        /// Comma separated list of registered type names.
        known: String,
    },

    /// The source image is missing, unreadable or fails to decode.
    #[error("image load failed for '{path}'")]
    ImageLoad {
        /// Path of the image.
        path: String,
        /// The underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The weight manifest or one of its shards is missing or corrupt.
    #[error("failed to load model from '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path of the manifest or shard that failed.
        model_path: String,
        /// What went wrong.
        reason: String,
        /// Suggested fix, already formatted (may be empty).
        suggestion: String,
        /// The underlying error, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Decoder or tensor input shapes are inconsistent.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// A message describing the invalid argument.
        message: String,
    },

    /// A non-finite score reached the decoder.
    #[error("non-finite score {value} at sample {sample}, step {step}")]
    NumericDegeneracy {
        /// Sample index in the batch.
        sample: usize,
        /// Time step within the sample.
        step: usize,
        /// The offending value.
        value: f32,
    },

    /// The forward pass failed.
    #[error("inference failed for model '{model_name}': {context}")]
    Inference {
        /// Name of the model.
        model_name: String,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The run was cancelled at a stage boundary.
    #[error("cancelled before {stage}")]
    Cancelled {
        /// The stage that was about to start.
        stage: ProcessingStage,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for recognition operations.
pub type OcrResult<T> = Result<T, OCRError>;

/// A plain message error used as the source of wrapped errors.
#[derive(Debug)]
pub struct SimpleError(String);

impl SimpleError {
    /// Creates a new message error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SimpleError {}

impl OCRError {
    /// Creates an OCRError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates an OCRError for configuration errors with context.
    ///
    /// # Arguments
    ///
    /// * `type_name` - The configuration entry that failed.
    /// * `field` - The field where the error occurred.
    /// * `reason` - The reason for the error.
    pub fn config_error_with_context(type_name: &str, field: &str, reason: &str) -> Self {
        Self::ConfigError {
            message: format!(
                "Configuration error in entry '{}', field '{}': {}",
                type_name, field, reason
            ),
        }
    }

    /// Creates an OCRError for an unregistered type.
    pub fn unknown_type(type_name: impl Into<String>, known: &[&str]) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
            known: known.join(", "),
        }
    }

    /// Creates an OCRError for an image that could not be read or decoded.
    pub fn image_load(path: &Path, source: image::ImageError) -> Self {
        Self::ImageLoad {
            path: path.display().to_string(),
            source,
        }
    }

    /// Creates an OCRError for a manifest or shard that could not be loaded.
    ///
    /// # Arguments
    ///
    /// * `model_path` - The manifest or shard path.
    /// * `reason` - Short description of the failure.
    /// * `suggestion` - Optional hint shown to the user.
    /// * `source` - Optional underlying error.
    pub fn model_load_error(
        model_path: impl AsRef<Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {}", s))
            .unwrap_or_default();
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an OCRError for inconsistent decoder or tensor input.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an OCRError for a failed forward pass.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an OCRError for a tensor shape mismatch with expected and actual shapes.
    pub fn shape_mismatch(component: &str, expected: &[usize], actual: &[usize]) -> Self {
        Self::InvalidArgument {
            message: format!(
                "{}: expected shape {:?}, got {:?}",
                component, expected, actual
            ),
        }
    }

    /// Returns true if this error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Implementation of From<crate::core::config::ConfigError> for OCRError.
///
/// This allows validation errors to be propagated with `?`.
impl From<crate::core::config::ConfigError> for OCRError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for OCRError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::ConfigError {
            message: format!("invalid parameters file: {error}"),
        }
    }
}
