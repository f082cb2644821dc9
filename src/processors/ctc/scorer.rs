//! Per-timestep arg-max scoring.

use crate::core::errors::{OCRError, OcrResult};
use ndarray::ArrayView1;

/// Finds the best class of one `(sample, timestep)` score row.
///
/// Returns `(best_score, best_class)`. On ties the lowest index wins, and a
/// NaN entry never displaces a comparable score. An empty row is a caller
/// error.
pub fn argmax_score(row: ArrayView1<'_, f32>) -> OcrResult<(f32, usize)> {
    let mut iter = row.iter().copied().enumerate();
    let (_, mut best_score) = iter
        .next()
        .ok_or_else(|| OCRError::invalid_argument("cannot score an empty class row"))?;
    let mut best_class = 0;

    for (class, score) in iter {
        if score > best_score || (best_score.is_nan() && !score.is_nan()) {
            best_score = score;
            best_class = class;
        }
    }

    Ok((best_score, best_class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    #[test]
    fn test_picks_maximum() {
        let row = array![-2.0f32, -0.1, -3.0];
        assert_eq!(argmax_score(row.view()).unwrap(), (-0.1, 1));
    }

    #[test]
    fn test_first_occurrence_wins_ties() {
        let row = array![-1.0f32, -0.5, -0.5, -0.5];
        assert_eq!(argmax_score(row.view()).unwrap(), (-0.5, 1));
    }

    #[test]
    fn test_nan_does_not_win() {
        let row = array![f32::NAN, -4.0, -5.0];
        assert_eq!(argmax_score(row.view()).unwrap(), (-4.0, 1));

        let row = array![-4.0f32, f32::NAN];
        assert_eq!(argmax_score(row.view()).unwrap(), (-4.0, 0));
    }

    #[test]
    fn test_empty_row_is_an_error() {
        let row = Array1::<f32>::zeros(0);
        let err = argmax_score(row.view()).unwrap_err();
        assert!(matches!(err, OCRError::InvalidArgument { .. }));
    }
}
