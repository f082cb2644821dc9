//! Tensor aliases shared by the preprocessing, inference and decoding stages.

/// A 2-dimensional tensor represented as a 2D array of f32 values.
pub type Tensor2D = ndarray::Array2<f32>;

/// A 3-dimensional tensor represented as a 3D array of f32 values.
pub type Tensor3D = ndarray::Array3<f32>;

/// A 4-dimensional tensor represented as a 4D array of f32 values.
pub type Tensor4D = ndarray::Array4<f32>;

/// A tensor of any rank, as returned by a forward pass.
pub type TensorD = ndarray::ArrayD<f32>;
