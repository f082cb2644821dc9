//! ONNX Runtime inference engine with session pooling.

use super::weights::WeightsManifest;
use super::{ModelLoader, SequenceModel};
use crate::core::batch::{Tensor4D, TensorD};
use crate::core::config::{
    OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig, RecognizerConfig,
};
use crate::core::constants::COMMON_INPUT_NAMES;
use crate::core::errors::{OCRError, OcrResult, SimpleError};
use ndarray::{ArrayViewD, IxDyn};
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::SessionBuilder;
use ort::value::{TensorRef, ValueType};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A pool of ONNX Runtime sessions over one serialized network.
///
/// Calls are spread round-robin over the pool so concurrent requests do not
/// serialize on a single session lock.
pub struct OrtInfer {
    sessions: Vec<Mutex<Session>>,
    next_idx: AtomicUsize,
    input_name: String,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Creates a session pool from an in-memory ONNX graph.
    ///
    /// When `input_name` is `None` the input is discovered from the graph,
    /// preferring the conventional names in [`COMMON_INPUT_NAMES`].
    pub fn from_bytes(
        model_name: impl Into<String>,
        model_path: impl AsRef<Path>,
        bytes: &[u8],
        input_name: Option<&str>,
        pool_size: usize,
        ort_session: Option<&OrtSessionConfig>,
    ) -> OcrResult<Self> {
        let path = model_path.as_ref();
        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let builder = Session::builder()?;
            let builder = match ort_session {
                Some(cfg) => Self::apply_ort_config(builder, cfg)?,
                None => builder.with_log_level(LogLevel::Error)?,
            };
            let session = builder.commit_from_memory(bytes).map_err(|e| {
                OCRError::model_load_error(
                    path,
                    "failed to create ONNX session from weight shards",
                    Some("check that the shards form a complete ONNX graph"),
                    Some(e),
                )
            })?;
            sessions.push(Mutex::new(session));
        }

        let input_name = match input_name {
            Some(name) => name.to_string(),
            None => Self::discover_input_name(&sessions, path)?,
        };

        Ok(OrtInfer {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name,
            model_path: path.to_path_buf(),
            model_name: model_name.into(),
        })
    }

    fn discover_input_name(sessions: &[Mutex<Session>], path: &Path) -> OcrResult<String> {
        let session = sessions
            .first()
            .ok_or_else(|| OCRError::invalid_argument("session pool is empty"))?
            .lock()
            .map_err(|_| OCRError::invalid_argument("failed to acquire session lock"))?;

        let names: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        COMMON_INPUT_NAMES
            .iter()
            .find(|candidate| names.contains(*candidate))
            .map(|name| name.to_string())
            .or_else(|| names.first().map(|name| name.to_string()))
            .ok_or_else(|| {
                OCRError::model_load_error(
                    path,
                    "network declares no inputs",
                    None,
                    None::<SimpleError>,
                )
            })
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        builder = builder.with_log_level(LogLevel::Error)?;
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(level) = cfg.optimization_level {
            use OrtGraphOptimizationLevel as OG;
            use ort::session::builder::GraphOptimizationLevel as GOL;
            let mapped = match level {
                OG::DisableAll => GOL::Disable,
                OG::Level1 => GOL::Level1,
                OG::Level2 => GOL::Level2,
                OG::Level3 => GOL::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        if let Some(eps) = &cfg.execution_providers {
            let providers = Self::build_execution_providers(eps);
            if !providers.is_empty() {
                builder = builder.with_execution_providers(providers)?;
            }
        }
        Ok(builder)
    }

    fn build_execution_providers(eps: &[OrtExecutionProvider]) -> Vec<ExecutionProviderDispatch> {
        let mut providers = Vec::new();
        for ep in eps {
            match ep {
                OrtExecutionProvider::CPU => {
                    providers
                        .push(ort::execution_providers::CPUExecutionProvider::default().build());
                }
                #[cfg(feature = "cuda")]
                OrtExecutionProvider::CUDA { device_id } => {
                    let mut cuda_provider =
                        ort::execution_providers::CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        cuda_provider = cuda_provider.with_device_id(*id);
                    }
                    providers.push(cuda_provider.build());
                }
                #[cfg(not(feature = "cuda"))]
                OrtExecutionProvider::CUDA { .. } => {
                    tracing::warn!(
                        "CUDA execution provider requested but the 'cuda' feature is disabled"
                    );
                }
            }
        }
        providers
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the input tensor name fed by [`OrtInfer::infer`].
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Returns the number of pooled sessions.
    pub fn pool_size(&self) -> usize {
        self.sessions.len()
    }

    /// Declared shape of the fed input, dynamic axes as `-1`.
    pub fn primary_input_shape(&self) -> Option<Vec<i64>> {
        let session_guard = self.sessions.first()?.lock().ok()?;
        let input = session_guard
            .inputs
            .iter()
            .find(|input| input.name == self.input_name)?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    fn get_output_name(&self) -> OcrResult<String> {
        let session = self.sessions[0]
            .lock()
            .map_err(|_| OCRError::invalid_argument("failed to acquire session lock"))?;
        session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                OCRError::invalid_argument("no outputs available in session; model may be corrupt")
            })
    }

    fn run_inference_with_processor<T>(
        &self,
        x: &Tensor4D,
        processor: impl FnOnce(&[i64], &[f32]) -> OcrResult<T>,
    ) -> OcrResult<T> {
        let input_shape = x.shape().to_vec();
        let output_name = self.get_output_name()?;

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!("failed to convert input tensor with shape {:?}", input_shape),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            OCRError::inference_error(
                &self.model_name,
                &format!(
                    "failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("session lock poisoned"),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!(
                    "forward pass failed with input '{}' -> output '{}'",
                    self.input_name, output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OCRError::inference_error(
                    &self.model_name,
                    &format!("failed to extract output tensor '{}' as f32", output_name),
                    e,
                )
            })?;

        processor(output_shape, output_data)
    }

    /// Runs one forward pass and returns the output with its native rank.
    pub fn infer(&self, x: &Tensor4D) -> OcrResult<TensorD> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            let dims = output_shape
                .iter()
                .map(|&d| {
                    usize::try_from(d).map_err(|_| {
                        OCRError::invalid_argument(format!(
                            "model '{}' returned a dynamic output dimension in {:?}",
                            self.model_name, output_shape
                        ))
                    })
                })
                .collect::<OcrResult<Vec<usize>>>()?;
            let view = ArrayViewD::from_shape(IxDyn(&dims), output_data)?;
            Ok(view.to_owned())
        })
    }
}

impl SequenceModel for OrtInfer {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn forward(&self, input: &Tensor4D) -> OcrResult<TensorD> {
        self.infer(input)
    }

    fn input_shape(&self) -> Option<Vec<i64>> {
        self.primary_input_shape()
    }
}

/// Loads networks by concatenating manifest shards into an ONNX graph.
#[derive(Debug, Clone)]
pub struct OrtModelLoader {
    session_pool_size: usize,
    ort_session: Option<OrtSessionConfig>,
}

impl OrtModelLoader {
    /// Creates a loader with one session per network and default options.
    pub fn new() -> Self {
        Self {
            session_pool_size: 1,
            ort_session: None,
        }
    }

    /// Creates a loader from the recognizer options.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self {
            session_pool_size: config.session_pool_size.unwrap_or(1),
            ort_session: config.ort_session.clone(),
        }
    }
}

impl ModelLoader for OrtModelLoader {
    fn load(
        &self,
        model_name: &str,
        model_path: &Path,
        shards_prefix: &Path,
    ) -> OcrResult<Box<dyn SequenceModel>> {
        let manifest = WeightsManifest::from_model_file(model_path)?;
        let bytes = manifest.read_shards(shards_prefix)?;
        tracing::info!(
            "Loading network '{}' from {} ({} tensors)",
            model_name,
            model_path.display(),
            manifest.tensor_count()
        );

        let infer = OrtInfer::from_bytes(
            model_name,
            model_path,
            &bytes,
            None,
            self.session_pool_size,
            self.ort_session.as_ref(),
        )?;
        Ok(Box::new(infer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_bytes_rejects_garbage_graph() {
        let result =
            OrtInfer::from_bytes("type1", "model.json", b"not an onnx graph", None, 2, None);
        assert!(matches!(result, Err(OCRError::ModelLoad { .. })));
    }

    #[test]
    fn test_loader_reports_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let loader = OrtModelLoader::from_config(&RecognizerConfig::new().session_pool_size(2));
        let result = loader.load("type1", &dir.path().join("model.json"), dir.path());
        assert!(matches!(result, Err(OCRError::ModelLoad { .. })));
    }

    #[test]
    fn test_loader_reports_missing_shard_before_session() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("model.json");
        fs::write(
            &model_path,
            r#"{"weightsManifest": [{"paths": ["group1-shard1of1.bin"], "weights": []}]}"#,
        )
        .unwrap();

        let err = OrtModelLoader::new()
            .load("type1", &model_path, dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("group1-shard1of1.bin"));
    }

    #[test]
    fn test_cpu_provider_is_built() {
        let providers = OrtInfer::build_execution_providers(&[OrtExecutionProvider::CPU]);
        assert_eq!(providers.len(), 1);
    }
}
