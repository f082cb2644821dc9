//! Constants used throughout the recognition pipeline.
//!
//! Every numeric literal shared between components lives here so that the
//! preprocessing, inference and decoding stages agree on a single value.

/// Additive floor applied before taking the natural log of network scores.
///
/// Keeps `ln(0)` from producing negative infinity when the network emits an
/// exact zero probability for a class.
pub const EPSILON: f32 = 1e-7;

/// Axis permutation from batch-major `(batch, time, classes)` to the
/// time-major `(time, batch, classes)` layout the decoder consumes.
pub const PERMUTATION: [usize; 3] = [1, 0, 2];

/// Dense block sizes of the DenseNet backbone shared by the DenseNet topologies.
pub const DENSENET_BLOCKS: [usize; 4] = [6, 12, 24, 16];

/// Number of best paths produced by the greedy decoder.
pub const TOP_PATHS: usize = 1;

/// Key of the weight manifest inside a model JSON file.
pub const WEIGHTS_KEY: &str = "weightsManifest";

/// Top-level key holding the per-type entries of a parameters file.
pub const PARAMS_ROOT_KEY: &str = "models";

/// Default location of the parameters file.
pub const DEFAULT_PARAMS_FILE: &str = "params.yaml";

/// Directory holding sample data.
pub const DATA_ROOT: &str = "data";

/// Directory under [`DATA_ROOT`] holding model manifests and shards.
pub const MODEL_ROOT: &str = "models";

/// The default threshold for parallel decoding.
///
/// Batches with more samples than this are decoded across the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

/// Maximum pixel value of 8-bit images, used to scale inputs into `[0, 1]`.
pub const PIXEL_SCALE: f32 = 255.0;

/// Input tensor names tried, in order, when a network does not name its input.
pub const COMMON_INPUT_NAMES: [&str; 5] = ["input_1", "input", "x", "image", "images"];
