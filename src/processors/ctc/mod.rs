//! Connectionist Temporal Classification decoding.

pub mod greedy;
pub mod scorer;
pub mod sparse;

pub use greedy::{CtcDecoder, CtcGreedyDecoder, DecodeOutput};
pub use scorer::argmax_score;
pub use sparse::SparseLabelBatch;
