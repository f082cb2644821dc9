//! Network loading and execution.
//!
//! The recognizer talks to networks through [`SequenceModel`] and obtains them
//! from a [`ModelLoader`]. The ONNX Runtime implementation lives in
//! [`ort_infer`]; tests substitute in-memory fakes.

pub mod ort_infer;
pub mod weights;

pub use ort_infer::{OrtInfer, OrtModelLoader};
pub use weights::{WeightGroup, WeightSpec, WeightsManifest};

use crate::core::batch::{Tensor4D, TensorD};
use crate::core::errors::{OCRError, OcrResult, SimpleError};
use std::path::Path;

/// A loaded network.
pub trait SequenceModel: Send + Sync + std::fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Runs a forward pass over an NHWC batch.
    ///
    /// Sequence networks return `(batch, time, classes)` or `(time, classes)`;
    /// classifiers return `(batch, classes)`.
    fn forward(&self, input: &Tensor4D) -> OcrResult<TensorD>;

    /// Input shape declared by the network, with dynamic axes as `-1`.
    ///
    /// `None` when the network does not declare one.
    fn input_shape(&self) -> Option<Vec<i64>> {
        None
    }
}

/// Builds networks from a model file and its weight shards.
pub trait ModelLoader: Send + Sync {
    /// Loads the network described by `model_path`, reading shards from
    /// `shards_prefix`.
    fn load(
        &self,
        model_name: &str,
        model_path: &Path,
        shards_prefix: &Path,
    ) -> OcrResult<Box<dyn SequenceModel>>;
}

/// Checks a declared network input shape against the NHWC shape the
/// preprocessing produces.
///
/// Negative (dynamic) axes match any size.
pub fn check_input_shape(
    model_path: &Path,
    declared: &[i64],
    expected: &[usize],
) -> OcrResult<()> {
    let matches = declared.len() == expected.len()
        && declared
            .iter()
            .zip(expected)
            .all(|(&d, &e)| d < 0 || usize::try_from(d).is_ok_and(|d| d == e));
    if matches {
        return Ok(());
    }
    Err(OCRError::model_load_error(
        model_path,
        format!(
            "network input {:?} does not accept preprocessed shape {:?}",
            declared, expected
        ),
        Some("check width, height and net_channels in the parameters file"),
        None::<SimpleError>,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_axes_match_any_size() {
        let path = Path::new("model.json");
        assert!(check_input_shape(path, &[-1, 64, 128, 1], &[1, 64, 128, 1]).is_ok());
        assert!(check_input_shape(path, &[1, -1, -1, 3], &[1, 50, 200, 3]).is_ok());
    }

    #[test]
    fn test_mismatched_input_is_model_load_error() {
        let path = Path::new("model.json");
        let err = check_input_shape(path, &[-1, 64, 128, 3], &[1, 64, 128, 1]).unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
        assert!(err.to_string().contains("model.json"));

        let err = check_input_shape(path, &[-1, 64, 128], &[1, 64, 128, 1]).unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
    }
}
