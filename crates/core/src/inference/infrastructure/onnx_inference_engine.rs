//! Age/gender/embedding network served by ONNX Runtime via `ort`.
//!
//! The session is created once from the model file. A missing or corrupt
//! file fails construction, the only unrecoverable error in the pipeline.

use std::collections::HashMap;
use std::path::Path;

use ndarray::ArrayView4;

use crate::inference::domain::inference_engine::{InferenceEngine, NamedOutputs};
use crate::inference::infrastructure::execution_provider::{
    preferred_execution_providers, provider_label,
};
use crate::shared::error::InferenceError;

pub struct OnnxInferenceEngine {
    session: ort::session::Session,
    output_names: Vec<String>,
}

impl OnnxInferenceEngine {
    /// Load `model_path` and fetch `output_names` on every call.
    pub fn new(
        model_path: &Path,
        output_names: Vec<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        log::info!(
            "Loaded {} ({} provider, {intra_threads} threads)",
            model_path.display(),
            provider_label()
        );
        Ok(Self {
            session,
            output_names,
        })
    }
}

impl InferenceEngine for OnnxInferenceEngine {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<NamedOutputs, InferenceError> {
        let input_value = ort::value::Tensor::from_array(input.to_owned())?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        let mut named = HashMap::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let value = outputs
                .get(name.as_str())
                .ok_or_else(|| format!("model has no output named `{name}`"))?;
            let array = value.try_extract_array::<f32>()?;
            named.insert(name.clone(), array.iter().copied().collect());
        }
        Ok(named)
    }
}
