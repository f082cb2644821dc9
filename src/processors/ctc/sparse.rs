//! Sparse packing of decoded label sequences.

use crate::core::errors::{OCRError, OcrResult};

/// A batch of variable-length label sequences in `(indices, values, shape)` form.
///
/// Entries are grouped by sample in increasing sample order and, within a
/// sample, in emission order. `shape` is `[batch_size, max_decoded_length]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseLabelBatch {
    /// `(sample, position)` pairs, one per emitted label.
    pub indices: Vec<[usize; 2]>,
    /// Emitted class indices, parallel to `indices`.
    pub values: Vec<usize>,
    /// `[batch_size, max_decoded_length]`.
    pub shape: [usize; 2],
}

impl SparseLabelBatch {
    /// Packs per-sample sequences.
    ///
    /// Runs as one sequential pass in sample order with a single flat offset
    /// shared by all samples.
    pub fn pack(sequences: &[Vec<usize>]) -> Self {
        let total: usize = sequences.iter().map(Vec::len).sum();
        let mut indices = Vec::with_capacity(total);
        let mut values = Vec::with_capacity(total);
        let mut max_decoded = 0;

        for (sample, sequence) in sequences.iter().enumerate() {
            max_decoded = max_decoded.max(sequence.len());
            for (position, &class) in sequence.iter().enumerate() {
                indices.push([sample, position]);
                values.push(class);
            }
        }

        Self {
            indices,
            values,
            shape: [sequences.len(), max_decoded],
        }
    }

    /// Number of stored labels.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no label was emitted for any sample.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of samples in the batch.
    pub fn batch_size(&self) -> usize {
        self.shape[0]
    }

    /// Labels emitted for `sample`, in emission order.
    pub fn sample(&self, sample: usize) -> impl Iterator<Item = usize> + '_ {
        self.indices
            .iter()
            .zip(&self.values)
            .filter(move |(index, _)| index[0] == sample)
            .map(|(_, &value)| value)
    }

    /// Rebuilds the dense per-sample sequences.
    ///
    /// Fails when the batch does not pass [`SparseLabelBatch::validate`].
    pub fn to_sequences(&self) -> OcrResult<Vec<Vec<usize>>> {
        self.validate()?;
        let mut sequences = vec![Vec::new(); self.batch_size()];
        for (index, &value) in self.indices.iter().zip(&self.values) {
            if let Some(sequence) = sequences.get_mut(index[0]) {
                sequence.push(value);
            }
        }
        Ok(sequences)
    }

    /// Checks the ordering and size invariants of the packed form.
    pub fn validate(&self) -> OcrResult<()> {
        if self.indices.len() != self.values.len() {
            return Err(OCRError::invalid_argument(format!(
                "sparse batch has {} indices but {} values",
                self.indices.len(),
                self.values.len()
            )));
        }

        let mut previous: Option<[usize; 2]> = None;
        let mut max_decoded = 0;
        for &[sample, position] in &self.indices {
            if sample >= self.shape[0] {
                return Err(OCRError::invalid_argument(format!(
                    "sample index {} out of range for batch of {}",
                    sample, self.shape[0]
                )));
            }
            let expected = match previous {
                Some([prev_sample, prev_position]) if prev_sample == sample => prev_position + 1,
                Some([prev_sample, _]) if prev_sample > sample => {
                    return Err(OCRError::invalid_argument(
                        "sparse entries are not in sample order",
                    ));
                }
                _ => 0,
            };
            if position != expected {
                return Err(OCRError::invalid_argument(format!(
                    "sample {} has position {} where {} was expected",
                    sample, position, expected
                )));
            }
            max_decoded = max_decoded.max(position + 1);
            previous = Some([sample, position]);
        }

        if max_decoded != self.shape[1] {
            return Err(OCRError::invalid_argument(format!(
                "shape declares {} columns but the longest sequence has {}",
                self.shape[1], max_decoded
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_uses_shared_offset() {
        let sequences = vec![vec![2, 3], vec![], vec![1, 1, 0]];
        let batch = SparseLabelBatch::pack(&sequences);

        assert_eq!(batch.indices, vec![[0, 0], [0, 1], [2, 0], [2, 1], [2, 2]]);
        assert_eq!(batch.values, vec![2, 3, 1, 1, 0]);
        assert_eq!(batch.shape, [3, 3]);
        assert!(batch.validate().is_ok());
        assert_eq!(batch.to_sequences().unwrap(), sequences);
        assert_eq!(batch.sample(2).collect::<Vec<_>>(), vec![1, 1, 0]);
    }

    #[test]
    fn test_pack_empty_batch() {
        let batch = SparseLabelBatch::pack(&[]);
        assert!(batch.is_empty());
        assert_eq!(batch.shape, [0, 0]);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_all_empty_sequences() {
        let batch = SparseLabelBatch::pack(&[vec![], vec![]]);
        assert_eq!(batch.shape, [2, 0]);
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_validate_rejects_out_of_order() {
        let batch = SparseLabelBatch {
            indices: vec![[1, 0], [0, 0]],
            values: vec![4, 5],
            shape: [2, 1],
        };
        assert!(batch.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_width() {
        let batch = SparseLabelBatch {
            indices: vec![[0, 0]],
            values: vec![4],
            shape: [1, 2],
        };
        assert!(batch.validate().is_err());
    }

    #[test]
    fn test_to_sequences_rejects_sample_out_of_range() {
        let batch = SparseLabelBatch {
            indices: vec![[0, 0], [3, 0]],
            values: vec![4, 5],
            shape: [2, 1],
        };
        assert!(matches!(
            batch.to_sequences(),
            Err(OCRError::InvalidArgument { .. })
        ));
    }
}
