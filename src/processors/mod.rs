//! Image and score processing stages.
//!
//! * [`letterbox`] turns a source image into the network input tensor.
//! * [`log_scores`] turns raw network output into time-major log scores.
//! * [`ctc`] decodes log scores into label sequences.

pub mod ctc;
pub mod letterbox;
pub mod log_scores;

pub use ctc::{CtcDecoder, CtcGreedyDecoder, DecodeOutput, SparseLabelBatch, argmax_score};
pub use letterbox::{LetterboxParams, preprocess};
