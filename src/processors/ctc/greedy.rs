//! Greedy (best path) CTC decoding.
//!
//! The decoder selects the most likely class at every timestep, drops the
//! blank class and, when enabled, collapses runs of the same class. Decoding
//! follows Graves et al. 2006: "Connectionist Temporal Classification:
//! Labelling Unsegmented Sequence Data with Recurrent Neural Networks".

use super::scorer::argmax_score;
use super::sparse::SparseLabelBatch;
use crate::core::batch::Tensor2D;
use crate::core::cancel::CancellationFlag;
use crate::core::constants::{DEFAULT_PARALLEL_THRESHOLD, TOP_PATHS};
use crate::core::errors::{OCRError, OcrResult, ProcessingStage};
use ndarray::{ArrayView3, s};
use rayon::prelude::*;

/// Output of one decode call.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    /// Decoded labels of the best path.
    pub batch: SparseLabelBatch,
    /// Cumulative negative log score per sample, shape `[batch_size, 1]`.
    pub log_probability: Tensor2D,
}

impl DecodeOutput {
    fn empty() -> Self {
        Self {
            batch: SparseLabelBatch::default(),
            log_probability: Tensor2D::zeros((0, TOP_PATHS)),
        }
    }
}

/// A decoder of time-major CTC scores.
pub trait CtcDecoder {
    /// Decodes `scores` shaped `[max_time, batch_size, num_classes]`.
    ///
    /// `valid_lengths[b]` is the number of leading timesteps consumed for
    /// sample `b`.
    fn decode(&self, scores: ArrayView3<'_, f32>, valid_lengths: &[usize])
    -> OcrResult<DecodeOutput>;
}

/// Best path decoder.
///
/// Regardless of `merge_repeated`, a timestep whose best class is the blank
/// emits nothing. With `merge_repeated`, a class equal to the previous
/// timestep's best class is not emitted again; the previous class tracks the
/// raw arg-max stream, so a blank between two equal labels keeps both.
#[derive(Debug, Clone)]
pub struct CtcGreedyDecoder {
    merge_repeated: bool,
    debug: bool,
    blank_index: Option<usize>,
    parallel_threshold: usize,
    cancel: Option<CancellationFlag>,
}

impl Default for CtcGreedyDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

struct SampleDecode {
    labels: Vec<usize>,
    neg_log_prob: f32,
}

impl CtcGreedyDecoder {
    /// Creates a decoder. The blank class defaults to the last class index.
    pub fn new(merge_repeated: bool) -> Self {
        Self {
            merge_repeated,
            debug: false,
            blank_index: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            cancel: None,
        }
    }

    /// Enables debug dumps of the decoded sequences.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the blank class index.
    ///
    /// The index is only compared for equality and is not validated
    /// against the number of classes.
    pub fn with_blank_index(mut self, blank_index: usize) -> Self {
        self.blank_index = Some(blank_index);
        self
    }

    /// Sets the batch size above which samples are decoded in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Polls `cancel` before each sample.
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns whether repeated classes are merged.
    pub fn merge_repeated(&self) -> bool {
        self.merge_repeated
    }

    fn decode_sample(
        &self,
        scores: &ArrayView3<'_, f32>,
        sample: usize,
        length: usize,
        blank: usize,
    ) -> OcrResult<SampleDecode> {
        if let Some(cancel) = &self.cancel {
            cancel.check(ProcessingStage::Decode)?;
        }

        let mut labels = Vec::new();
        let mut neg_log_prob = 0.0f32;
        let mut previous: Option<usize> = None;

        for step in 0..length {
            let (score, class) = argmax_score(scores.slice(s![step, sample, ..]))?;
            if !score.is_finite() {
                return Err(OCRError::NumericDegeneracy {
                    sample,
                    step,
                    value: score,
                });
            }
            neg_log_prob += -score;

            if class != blank && !(self.merge_repeated && previous == Some(class)) {
                labels.push(class);
            }
            previous = Some(class);
        }

        Ok(SampleDecode {
            labels,
            neg_log_prob,
        })
    }
}

impl CtcDecoder for CtcGreedyDecoder {
    fn decode(
        &self,
        scores: ArrayView3<'_, f32>,
        valid_lengths: &[usize],
    ) -> OcrResult<DecodeOutput> {
        let (max_time, batch_size, num_classes) = scores.dim();

        if valid_lengths.len() != batch_size {
            return Err(OCRError::invalid_argument(format!(
                "valid_lengths has {} entries but the batch size is {}",
                valid_lengths.len(),
                batch_size
            )));
        }
        if let Some((sample, &length)) = valid_lengths
            .iter()
            .enumerate()
            .find(|(_, length)| **length > max_time)
        {
            return Err(OCRError::invalid_argument(format!(
                "valid length {} of sample {} exceeds max_time {}",
                length, sample, max_time
            )));
        }
        if batch_size == 0 {
            return Ok(DecodeOutput::empty());
        }

        let blank = self
            .blank_index
            .unwrap_or_else(|| num_classes.saturating_sub(1));

        let decoded: Vec<SampleDecode> = if batch_size > self.parallel_threshold {
            (0..batch_size)
                .into_par_iter()
                .map(|b| self.decode_sample(&scores, b, valid_lengths[b], blank))
                .collect::<OcrResult<_>>()?
        } else {
            (0..batch_size)
                .map(|b| self.decode_sample(&scores, b, valid_lengths[b], blank))
                .collect::<OcrResult<_>>()?
        };

        let mut log_probability = Tensor2D::zeros((batch_size, TOP_PATHS));
        let mut sequences = Vec::with_capacity(batch_size);
        for (b, sample) in decoded.into_iter().enumerate() {
            log_probability[[b, 0]] = sample.neg_log_prob;
            sequences.push(sample.labels);
        }

        let batch = SparseLabelBatch::pack(&sequences);

        if self.debug {
            tracing::debug!(
                "CTC greedy decode: batch_size={}, max_time={}, num_classes={}, blank={}",
                batch_size,
                max_time,
                num_classes,
                blank
            );
            tracing::debug!("Indices: {:?}", batch.indices);
            tracing::debug!("Values: {:?}", batch.values);
            tracing::debug!("Shape: {:?}", batch.shape);
            tracing::debug!("Log probability: {:?}", log_probability.column(0).to_vec());
        }

        Ok(DecodeOutput {
            batch,
            log_probability,
        })
    }
}
