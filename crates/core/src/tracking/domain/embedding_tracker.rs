use crate::shared::error::FaceAttributeError;

/// L2-normalize an identity embedding.
pub fn normalize(embedding: &[f32]) -> Result<Vec<f32>, FaceAttributeError> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(FaceAttributeError::DegenerateEmbedding);
    }
    Ok(embedding.iter().map(|x| x / norm).collect())
}

/// Mean squared component difference between two embeddings.
pub fn mean_squared_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "embeddings must have equal length");
    if a.is_empty() {
        return 0.0;
    }
    let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    sum / a.len() as f32
}

/// Remembers the previous frame's embedding and reports how far the
/// current one moved from it.
///
/// Holds at most one embedding. There is no reset: a new camera session
/// gets a new tracker.
#[derive(Debug, Default)]
pub struct EmbeddingTracker {
    previous: Option<Vec<f32>>,
}

impl EmbeddingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `normalized` and return its distance to the previously stored
    /// embedding, or `None` on the first observation.
    pub fn observe(&mut self, normalized: Vec<f32>) -> Option<f32> {
        let distance = self
            .previous
            .as_deref()
            .map(|prev| mean_squared_distance(&normalized, prev));
        self.previous = Some(normalized);
        distance
    }

    pub fn previous(&self) -> Option<&[f32]> {
        self.previous.as_deref()
    }
}
