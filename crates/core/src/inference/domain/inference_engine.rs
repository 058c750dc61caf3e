use std::collections::HashMap;

use ndarray::ArrayView4;

use crate::shared::error::InferenceError;

/// Raw output tensors keyed by output name, flattened in row-major order.
pub type NamedOutputs = HashMap<String, Vec<f32>>;

/// Domain interface for the network forward pass.
///
/// Takes one `[1, H, W, 3]` tensor and returns every configured output.
/// Implementations may hold a mutable session, hence `&mut self`.
pub trait InferenceEngine: Send {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<NamedOutputs, InferenceError>;
}
