use serde::Serialize;

use crate::decoding::domain::gender::Gender;

/// Attributes estimated for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeResult {
    pub age: u32,
    pub gender: Gender,
    /// Raw gender head output the label was derived from.
    pub gender_score: f32,
    /// Distance to the previous frame's embedding; absent on the first frame.
    pub embedding_distance: Option<f32>,
    /// Unit-length identity embedding.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub latency_ms: u64,
}

/// Renders as `"42ms dist=0.0012 age=31 male"`.
impl std::fmt::Display for AttributeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.latency_ms)?;
        if let Some(d) = self.embedding_distance {
            write!(f, " dist={d:.4}")?;
        }
        write!(f, " age={} {}", self.age, self.gender)
    }
}
