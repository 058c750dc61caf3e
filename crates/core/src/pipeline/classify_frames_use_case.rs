use crate::capture::domain::frame_source::FrameSource;
use crate::pipeline::attribute_result::AttributeResult;
use crate::pipeline::face_attribute_pipeline::FaceAttributePipeline;
use crate::shared::error::FaceAttributeError;

/// Result of one frame: its index in the source and what the pipeline made
/// of it.
#[derive(Debug)]
pub struct FrameOutcome {
    pub index: usize,
    pub result: Result<AttributeResult, FaceAttributeError>,
}

/// Called after each frame, in order.
pub type OutcomeFn = Box<dyn FnMut(&FrameOutcome) + Send>;

/// Multi-frame run: read → classify → report, one frame at a time.
///
/// Classification failures stay with their frame and the run continues.
/// A frame the source itself cannot produce aborts the run.
pub struct ClassifyFramesUseCase {
    source: Box<dyn FrameSource>,
    pipeline: FaceAttributePipeline,
    on_outcome: Option<OutcomeFn>,
}

impl ClassifyFramesUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        pipeline: FaceAttributePipeline,
        on_outcome: Option<OutcomeFn>,
    ) -> Self {
        Self {
            source,
            pipeline,
            on_outcome,
        }
    }

    pub fn execute(&mut self) -> Result<Vec<FrameOutcome>, Box<dyn std::error::Error>> {
        let total = self.source.len_hint().unwrap_or(0);
        let mut outcomes = Vec::with_capacity(total);

        for (position, frame) in self.source.frames().enumerate() {
            let frame = frame?;
            let result = self.pipeline.classify(&frame);
            if let Err(e) = &result {
                self.pipeline
                    .logger_mut()
                    .failure(frame.index(), e.kind(), &e.to_string());
            }
            self.pipeline.logger_mut().progress(position + 1, total);

            let outcome = FrameOutcome {
                index: frame.index(),
                result,
            };
            if let Some(cb) = self.on_outcome.as_mut() {
                cb(&outcome);
            }
            outcomes.push(outcome);
        }

        self.pipeline.logger_mut().summary();
        Ok(outcomes)
    }

    /// Hand the pipeline back, keeping its tracker state for later frames.
    pub fn into_pipeline(self) -> FaceAttributePipeline {
        self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::domain::inference_engine::{InferenceEngine, NamedOutputs};
    use crate::pipeline::pipeline_config::{OutputBinding, OutputSpec, PipelineConfig};
    use crate::pipeline::pipeline_logger::PipelineLogger;
    use crate::shared::error::InferenceError;
    use crate::shared::frame::Frame;
    use ndarray::ArrayView4;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubSource {
        frames: Vec<Result<Frame, String>>,
    }

    impl FrameSource for StubSource {
        fn len_hint(&self) -> Option<usize> {
            Some(self.frames.len())
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(
                self.frames
                    .drain(..)
                    .map(|f| f.map_err(|e| -> Box<dyn std::error::Error> { e.into() })),
            )
        }
    }

    /// Embedding derived from the first tensor value so each frame differs.
    struct EchoEngine;

    impl InferenceEngine for EchoEngine {
        fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<NamedOutputs, InferenceError> {
            let v = input[[0, 0, 0, 0]];
            let mut age = vec![0.0; 100];
            age[35] = 1.0;
            Ok(NamedOutputs::from([
                ("age".to_string(), age),
                ("gender".to_string(), vec![0.3]),
                ("features".to_string(), vec![v, 1.0]),
            ]))
        }
    }

    #[derive(Default)]
    struct Recorded {
        progress: Vec<(usize, usize)>,
        failures: Vec<(usize, String)>,
        summaries: usize,
    }

    struct RecordingLogger(Arc<Mutex<Recorded>>);

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, current: usize, total: usize) {
            self.0.lock().unwrap().progress.push((current, total));
        }
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn metric(&mut self, _name: &str, _value: f64) {}
        fn failure(&mut self, frame_index: usize, kind: &str, _message: &str) {
            self.0
                .lock()
                .unwrap()
                .failures
                .push((frame_index, kind.to_string()));
        }
        fn summary(&self) {
            self.0.lock().unwrap().summaries += 1;
        }
    }

    // --- Helpers ---

    fn pipeline(recorded: Arc<Mutex<Recorded>>) -> FaceAttributePipeline {
        let config = PipelineConfig {
            input_width: 2,
            input_height: 2,
            outputs: OutputSpec {
                age_distribution: OutputBinding::new("age", 100),
                gender_score: OutputBinding::new("gender", 1),
                embedding: OutputBinding::new("features", 2),
            },
            ..PipelineConfig::default()
        };
        FaceAttributePipeline::new(config, Box::new(EchoEngine))
            .unwrap()
            .with_logger(Box::new(RecordingLogger(recorded)))
    }

    fn frame(size: u32, red: u8, index: usize) -> Frame {
        Frame::filled(size, size, [red, 0, 0], index)
    }

    // --- Tests ---

    #[test]
    fn test_classifies_every_frame_in_order() {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let source = StubSource {
            frames: vec![Ok(frame(2, 200, 0)), Ok(frame(2, 200, 1)), Ok(frame(2, 100, 2))],
        };
        let mut uc = ClassifyFramesUseCase::new(Box::new(source), pipeline(recorded.clone()), None);

        let outcomes = uc.execute().unwrap();

        assert_eq!(outcomes.iter().map(|o| o.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        let results: Vec<_> = outcomes.iter().map(|o| o.result.as_ref().unwrap()).collect();
        assert_eq!(results[0].age, 36);
        assert_eq!(results[0].embedding_distance, None);
        assert_eq!(results[1].embedding_distance, Some(0.0));
        assert!(results[2].embedding_distance.unwrap() > 0.0);

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(recorded.summaries, 1);
    }

    #[test]
    fn test_failed_frame_does_not_stop_the_run() {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let source = StubSource {
            frames: vec![Ok(frame(2, 200, 0)), Ok(frame(5, 200, 1)), Ok(frame(2, 200, 2))],
        };
        let mut uc = ClassifyFramesUseCase::new(Box::new(source), pipeline(recorded.clone()), None);

        let outcomes = uc.execute().unwrap();

        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(FaceAttributeError::InvalidInputShape { .. })
        ));
        // Compared against frame 0; the rejected frame never reached the tracker
        assert_eq!(
            outcomes[2].result.as_ref().unwrap().embedding_distance,
            Some(0.0)
        );
        assert_eq!(
            recorded.lock().unwrap().failures,
            vec![(1, "invalid_input_shape".to_string())]
        );
    }

    #[test]
    fn test_source_error_aborts_run() {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let source = StubSource {
            frames: vec![Ok(frame(2, 200, 0)), Err("corrupt image".to_string())],
        };
        let mut uc = ClassifyFramesUseCase::new(Box::new(source), pipeline(recorded), None);

        let err = uc.execute().unwrap_err();
        assert_eq!(err.to_string(), "corrupt image");
    }

    #[test]
    fn test_callback_sees_each_outcome() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let source = StubSource {
            frames: vec![Ok(frame(2, 10, 0)), Ok(frame(2, 20, 1))],
        };
        let mut uc = ClassifyFramesUseCase::new(
            Box::new(source),
            pipeline(Arc::new(Mutex::new(Recorded::default()))),
            Some(Box::new(move |o: &FrameOutcome| {
                sink.lock().unwrap().push((o.index, o.result.is_ok()));
            })),
        );

        uc.execute().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(0, true), (1, true)]);
    }

    #[test]
    fn test_pipeline_state_survives_the_run() {
        let source = StubSource {
            frames: vec![Ok(frame(2, 50, 0))],
        };
        let mut uc = ClassifyFramesUseCase::new(
            Box::new(source),
            pipeline(Arc::new(Mutex::new(Recorded::default()))),
            None,
        );
        uc.execute().unwrap();

        let p = uc.into_pipeline();
        assert!(p.tracker().previous().is_some());
    }
}
