use std::time::Instant;

use crate::decoding::domain::distribution_decoder::DistributionDecoder;
use crate::encoding::domain::tensor_encoder::TensorEncoder;
use crate::inference::domain::inference_engine::InferenceEngine;
use crate::inference::domain::raw_outputs::RawOutputs;
use crate::pipeline::attribute_result::AttributeResult;
use crate::pipeline::pipeline_config::{ConfigError, PipelineConfig};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::error::FaceAttributeError;
use crate::shared::frame::Frame;
use crate::tracking::domain::embedding_tracker::{normalize, EmbeddingTracker};

/// Per-frame classifier: encode → infer → decode → track.
///
/// One instance corresponds to one camera session. The embedding tracker
/// lives here, so dropping the pipeline is the only way to forget the
/// previous frame.
pub struct FaceAttributePipeline {
    config: PipelineConfig,
    encoder: TensorEncoder,
    engine: Box<dyn InferenceEngine>,
    decoder: DistributionDecoder,
    tracker: EmbeddingTracker,
    logger: Box<dyn PipelineLogger>,
}

impl FaceAttributePipeline {
    pub fn new(
        config: PipelineConfig,
        engine: Box<dyn InferenceEngine>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "Pipeline for {} at {}x{} ({} layout)",
            config.model_identifier,
            config.input_width,
            config.input_height,
            config.layout
        );
        Ok(Self {
            encoder: TensorEncoder::new(config.input_width, config.input_height, config.layout),
            decoder: DistributionDecoder::new(config.age_top_k, config.gender_threshold),
            tracker: EmbeddingTracker::new(),
            logger: Box::new(NullPipelineLogger),
            engine,
            config,
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn tracker(&self) -> &EmbeddingTracker {
        &self.tracker
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    /// Classify one frame.
    ///
    /// Runs exactly one forward pass. On any error the frame is dropped and
    /// the tracker keeps the embedding from the last successful frame.
    pub fn classify(&mut self, frame: &Frame) -> Result<AttributeResult, FaceAttributeError> {
        let start = Instant::now();

        let input = self.encoder.encode(frame)?;
        let encoded_at = Instant::now();
        self.logger
            .timing("encode", ms_between(start, encoded_at));

        let outputs = self
            .engine
            .infer(input)
            .map_err(FaceAttributeError::InferenceFailure)?;
        let inferred_at = Instant::now();
        let inference_ms = ms_between(encoded_at, inferred_at);
        self.logger.timing("inference", inference_ms);
        log::debug!("Frame {}: inference took {inference_ms:.1}ms", frame.index());

        let raw = RawOutputs::from_named(outputs, &self.config.outputs)?;
        let embedding = normalize(&raw.embedding)?;
        let age = self.decoder.decode_age(&raw.age_distribution)?;
        let gender = self.decoder.decode_gender(raw.gender_score);
        if let (Some(first), Some(last)) = (embedding.first(), embedding.last()) {
            log::debug!("Frame {}: embedding first={first} last={last}", frame.index());
        }

        // Committed only after every fallible step has succeeded
        let embedding_distance = self.tracker.observe(embedding.clone());
        if let Some(d) = embedding_distance {
            self.logger.metric("embedding_distance", d as f64);
        }
        self.logger.timing("decode", ms_between(inferred_at, Instant::now()));

        Ok(AttributeResult {
            age,
            gender,
            gender_score: raw.gender_score,
            embedding_distance,
            embedding,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn ms_between(from: Instant, to: Instant) -> f64 {
    to.duration_since(from).as_secs_f64() * 1000.0
}
