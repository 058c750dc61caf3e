use thiserror::Error;

/// Error type returned by inference engines.
pub type InferenceError = Box<dyn std::error::Error + Send + Sync>;

/// Frame-local classification failures.
///
/// None of these poison the pipeline: the failing frame is dropped and the
/// next call starts from the same tracker state.
#[derive(Error, Debug)]
pub enum FaceAttributeError {
    #[error(
        "frame is {actual_width}x{actual_height}, model expects {expected_width}x{expected_height}"
    )]
    InvalidInputShape {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("degenerate age distribution: {0}")]
    DegenerateDistribution(String),
    #[error("embedding has zero or non-finite norm")]
    DegenerateEmbedding,
    #[error("inference failed: {0}")]
    InferenceFailure(#[source] InferenceError),
    #[error("model output `{name}`: {reason}")]
    InvalidOutput { name: String, reason: String },
}

impl FaceAttributeError {
    /// Short stable name, used as a metric key.
    pub fn kind(&self) -> &'static str {
        match self {
            FaceAttributeError::InvalidInputShape { .. } => "invalid_input_shape",
            FaceAttributeError::DegenerateDistribution(_) => "degenerate_distribution",
            FaceAttributeError::DegenerateEmbedding => "degenerate_embedding",
            FaceAttributeError::InferenceFailure(_) => "inference_failure",
            FaceAttributeError::InvalidOutput { .. } => "invalid_output",
        }
    }
}
