//! Recognition pipeline.
//!
//! [`Recognizer`] drives one request through catalog lookup, letterboxing,
//! network loading, inference and greedy CTC decoding. [`recognize`] wraps
//! it for one-shot use.

pub mod recognizer;
pub mod stage;

pub use recognizer::{Recognition, RecognitionJob, Recognizer, recognize};
pub use stage::{RunStage, StageTracker};
