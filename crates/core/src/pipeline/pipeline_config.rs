use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::domain::layout::Layout;
use crate::shared::constants::{
    AGE_BINS, AGE_OUTPUT_NAME, AGE_TOP_K, EMBEDDING_DIM, EMBEDDING_OUTPUT_NAME,
    GENDER_OUTPUT_NAME, GENDER_THRESHOLD, INPUT_SIZE, MODEL_NAME,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A named model output and the number of `f32` values it must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub name: String,
    pub length: usize,
}

impl OutputBinding {
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// The three network heads, in age, gender, embedding order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub age_distribution: OutputBinding,
    pub gender_score: OutputBinding,
    pub embedding: OutputBinding,
}

impl OutputSpec {
    pub fn ordered(&self) -> [&OutputBinding; 3] {
        [&self.age_distribution, &self.gender_score, &self.embedding]
    }

    pub fn names(&self) -> Vec<String> {
        self.ordered().iter().map(|b| b.name.clone()).collect()
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            age_distribution: OutputBinding::new(AGE_OUTPUT_NAME, AGE_BINS),
            gender_score: OutputBinding::new(GENDER_OUTPUT_NAME, 1),
            embedding: OutputBinding::new(EMBEDDING_OUTPUT_NAME, EMBEDDING_DIM),
        }
    }
}

/// Everything a pipeline needs to know about its model, fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model_identifier: String,
    pub input_width: u32,
    pub input_height: u32,
    pub layout: Layout,
    pub outputs: OutputSpec,
    /// Deadline for one forward pass. `None` waits indefinitely.
    pub inference_timeout_ms: Option<u64>,
    pub age_top_k: usize,
    pub gender_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_identifier: MODEL_NAME.to_string(),
            input_width: INPUT_SIZE,
            input_height: INPUT_SIZE,
            layout: Layout::Planar,
            outputs: OutputSpec::default(),
            inference_timeout_ms: None,
            age_top_k: AGE_TOP_K,
            gender_threshold: GENDER_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_identifier.trim().is_empty() {
            return Err(ConfigError::Invalid("model_identifier is empty".into()));
        }
        if self.input_width == 0 || self.input_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "input resolution must be positive, got {}x{}",
                self.input_width, self.input_height
            )));
        }
        let bindings = self.outputs.ordered();
        for (i, binding) in bindings.iter().enumerate() {
            if binding.name.is_empty() || binding.length == 0 {
                return Err(ConfigError::Invalid(format!(
                    "output `{}` needs a name and a positive length",
                    binding.name
                )));
            }
            if bindings[..i].iter().any(|b| b.name == binding.name) {
                return Err(ConfigError::Invalid(format!(
                    "output name `{}` is used twice",
                    binding.name
                )));
            }
        }
        if self.age_top_k == 0 || self.age_top_k > self.outputs.age_distribution.length {
            return Err(ConfigError::Invalid(format!(
                "age_top_k must be between 1 and {}, got {}",
                self.outputs.age_distribution.length, self.age_top_k
            )));
        }
        if !self.gender_threshold.is_finite() {
            return Err(ConfigError::Invalid("gender_threshold must be finite".into()));
        }
        if self.inference_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("inference_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }
}
