//! Conversion of raw network outputs into time-major log scores.

use crate::core::batch::{Tensor3D, TensorD};
use crate::core::constants::{EPSILON, PERMUTATION};
use crate::core::errors::{OCRError, OcrResult};
use ndarray::{Axis, Ix2, Ix3, s};

/// Brings a sequence network output to `(batch, time, classes)`.
///
/// A `(time, classes)` output is taken as a batch of one.
pub fn expand_batch(output: TensorD) -> OcrResult<Tensor3D> {
    match output.ndim() {
        2 => Ok(output.into_dimensionality::<Ix2>()?.insert_axis(Axis(0))),
        3 => Ok(output.into_dimensionality::<Ix3>()?),
        _ => Err(OCRError::invalid_argument(format!(
            "sequence output must have rank 2 or 3, got shape {:?}",
            output.shape()
        ))),
    }
}

/// Transposes `(batch, time, classes)` probabilities to
/// `(time, batch, classes)` and applies `ln(x + EPSILON)`.
pub fn time_major_log_scores(probabilities: &Tensor3D) -> Tensor3D {
    probabilities
        .view()
        .permuted_axes(PERMUTATION)
        .mapv(|p| (p + EPSILON).ln())
}

/// Lifts classifier probabilities `(batch, classes)` to a single timestep of
/// time-major log scores with a blank column appended.
///
/// The blank column is floored at `ln(EPSILON)` so it never outranks a
/// softmax class.
pub fn classifier_log_scores(output: TensorD) -> OcrResult<Tensor3D> {
    let probabilities = output.into_dimensionality::<Ix2>().map_err(|e| {
        OCRError::invalid_argument(format!("classifier output must have rank 2: {}", e))
    })?;
    let (batch, classes) = probabilities.dim();

    let mut scores = Tensor3D::from_elem((1, batch, classes + 1), EPSILON.ln());
    scores
        .slice_mut(s![0, .., ..classes])
        .assign(&probabilities.mapv(|p| (p + EPSILON).ln()));
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3, array};

    #[test]
    fn test_rank_two_becomes_batch_of_one() {
        let output = Array2::<f32>::zeros((7, 5)).into_dyn();
        assert_eq!(expand_batch(output).unwrap().dim(), (1, 7, 5));
    }

    #[test]
    fn test_rank_four_rejected() {
        let output = ndarray::Array4::<f32>::zeros((1, 1, 2, 3)).into_dyn();
        assert!(matches!(
            expand_batch(output),
            Err(OCRError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_transpose_and_log() {
        let mut probabilities = Array3::<f32>::zeros((2, 3, 4));
        probabilities[[1, 2, 3]] = 1.0;

        let scores = time_major_log_scores(&probabilities);
        assert_eq!(scores.dim(), (3, 2, 4));
        assert!((scores[[2, 1, 3]] - (1.0 + EPSILON).ln()).abs() < 1e-6);
        assert!(scores[[0, 0, 0]].is_finite());
        assert!((scores[[0, 0, 0]] - EPSILON.ln()).abs() < 1e-3);
    }

    #[test]
    fn test_classifier_gains_blank_column() {
        let output = array![[0.1f32, 0.7, 0.2], [0.5, 0.25, 0.25]].into_dyn();
        let scores = classifier_log_scores(output).unwrap();
        assert_eq!(scores.dim(), (1, 2, 4));
        assert!((scores[[0, 0, 1]] - (0.7f32 + EPSILON).ln()).abs() < 1e-6);
        assert_eq!(scores[[0, 1, 3]], EPSILON.ln());
    }
}
