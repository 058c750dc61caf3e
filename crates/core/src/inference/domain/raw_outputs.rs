use crate::inference::domain::inference_engine::NamedOutputs;
use crate::pipeline::pipeline_config::{OutputBinding, OutputSpec};
use crate::shared::error::FaceAttributeError;

/// The three heads of the network for one frame, length-checked.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutputs {
    pub age_distribution: Vec<f32>,
    pub gender_score: f32,
    pub embedding: Vec<f32>,
}

impl RawOutputs {
    /// Pull the configured outputs out of an engine response.
    ///
    /// Extra outputs are ignored; missing or wrongly sized ones are errors.
    pub fn from_named(
        mut outputs: NamedOutputs,
        spec: &OutputSpec,
    ) -> Result<Self, FaceAttributeError> {
        let age_distribution = take(&mut outputs, &spec.age_distribution)?;
        let gender = take(&mut outputs, &spec.gender_score)?;
        let embedding = take(&mut outputs, &spec.embedding)?;

        let gender_score = gender
            .first()
            .copied()
            .ok_or_else(|| FaceAttributeError::InvalidOutput {
                name: spec.gender_score.name.clone(),
                reason: "empty tensor".to_string(),
            })?;

        Ok(Self {
            age_distribution,
            gender_score,
            embedding,
        })
    }
}

fn take(
    outputs: &mut NamedOutputs,
    binding: &OutputBinding,
) -> Result<Vec<f32>, FaceAttributeError> {
    let values = outputs
        .remove(&binding.name)
        .ok_or_else(|| FaceAttributeError::InvalidOutput {
            name: binding.name.clone(),
            reason: "missing from engine response".to_string(),
        })?;
    if values.len() != binding.length {
        return Err(FaceAttributeError::InvalidOutput {
            name: binding.name.clone(),
            reason: format!("expected {} values, got {}", binding.length, values.len()),
        });
    }
    Ok(values)
}
