//! # Captcha OCR
//!
//! A Rust library that reads captcha images with convolutional-recurrent
//! ONNX networks and greedy CTC decoding.
//!
//! ## Features
//!
//! - Per-type preprocessing geometry and alphabets from a YAML parameters file
//! - Letterbox preprocessing to the network's aspect ratio
//! - Weight manifests with sharded ONNX graphs
//! - Greedy (best path) CTC decoding with blank suppression and repeat merging
//! - Whole-image classifiers decoded through the same path
//! - Cooperative cancellation at stage boundaries
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, constants and the inference engine
//! * [`domain`] - Registered types, topologies, alphabets and the catalog
//! * [`processors`] - Letterboxing, log-score conversion and CTC decoding
//! * [`pipeline`] - The recognizer driving a request end to end
//! * [`utils`] - Image loading and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use captcha_ocr::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let text = recognize(
//!     "type1",
//!     "params.yaml",
//!     "data/example1.png",
//!     "data/models/type1",
//! )?;
//! println!("Decoded: {text}");
//! # Ok(())
//! # }
//! ```
//!
//! ### Reusing a recognizer
//!
//! ```rust,no_run
//! use captcha_ocr::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = ModelCatalog::from_path("params.yaml")?;
//! let config = RecognizerConfig::new().session_pool_size(2).debug(true);
//! let recognizer = Recognizer::new(catalog, config)?;
//!
//! let jobs = vec![
//!     RecognitionJob::new("type3", "data/example3.png", "data/models/type3"),
//!     RecognitionJob::new("recaptcha", "data/example9.jpg", "data/models/recaptcha"),
//! ];
//! for result in recognizer.run_all(&jobs) {
//!     println!("{:?}", result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use captcha_ocr::prelude::*;
/// ```
///
/// Included items cover the common path: the recognizer and its
/// configuration, the catalog, the decoder, and the error types.
pub mod prelude {
    pub use crate::core::config::{ParamsFile, RecognizerConfig};
    pub use crate::core::{CancellationFlag, OCRError, OcrResult};
    pub use crate::domain::{CatalogEntry, ModelCatalog, ModelType};
    pub use crate::pipeline::{Recognition, RecognitionJob, Recognizer, recognize};
    pub use crate::processors::ctc::{CtcDecoder, CtcGreedyDecoder, SparseLabelBatch};
    pub use crate::utils::load_image;
}
