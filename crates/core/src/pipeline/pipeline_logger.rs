use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Observer for per-frame pipeline events.
///
/// Lets the CLI collect timings and failure counts without the pipeline
/// knowing where they end up.
pub trait PipelineLogger: Send {
    /// Report how many frames of a run have been handled.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-frame value (e.g. embedding distance).
    fn metric(&mut self, name: &str, value: f64);

    /// Record a frame that was dropped, keyed by error kind.
    fn failure(&mut self, frame_index: usize, kind: &str, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Default for pipelines built without a logger.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn failure(&mut self, _frame_index: usize, _kind: &str, _message: &str) {}
}

/// Aggregates stage timings, metrics and failures, and writes a summary
/// through the `log` crate when the run ends.
///
/// Progress lines are throttled to every `throttle_frames` frames.
pub struct SummaryPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    failures: BTreeMap<String, usize>,
    start_time: Instant,
    frames_seen: usize,
}

impl SummaryPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            failures: BTreeMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    /// Formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.failures.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Classified {} frames in {:.1}s:",
            self.frames_seen,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, durations) in stages {
            lines.push(format!(
                "  {stage:10}: mean {:6.1}ms  max {:6.1}ms",
                mean(durations),
                durations.iter().copied().fold(0.0, f64::max)
            ));
        }

        let mut names: Vec<_> = self.metrics.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        for (name, values) in names {
            lines.push(format!("  {name}: mean {:.4}", mean(values)));
        }

        for (kind, count) in &self.failures {
            lines.push(format!("  failed ({kind}): {count}"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn failures_of(&self, kind: &str) -> usize {
        self.failures.get(kind).copied().unwrap_or(0)
    }
}

impl Default for SummaryPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl PipelineLogger for SummaryPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            log::info!("Classified {current}/{total} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn failure(&mut self, frame_index: usize, kind: &str, message: &str) {
        *self.failures.entry(kind.to_string()).or_default() += 1;
        log::warn!("Frame {frame_index} dropped: {message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("inference", 5.0);
        logger.metric("embedding_distance", 0.1);
        logger.failure(3, "degenerate_embedding", "zero norm");
        logger.summary();
    }

    #[test]
    fn test_timings_are_grouped_by_stage() {
        let mut logger = SummaryPipelineLogger::new(10);
        logger.timing("inference", 20.0);
        logger.timing("inference", 30.0);
        logger.timing("encode", 1.5);

        assert_eq!(logger.timings_for("inference").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("encode").unwrap(), &[1.5]);
        assert!(logger.timings_for("decode").is_none());
    }

    #[test]
    fn test_failures_are_counted_by_kind() {
        let mut logger = SummaryPipelineLogger::new(10);
        logger.failure(0, "invalid_input_shape", "frame is 10x10");
        logger.failure(4, "invalid_input_shape", "frame is 10x10");
        logger.failure(5, "inference_failure", "timed out");

        assert_eq!(logger.failures_of("invalid_input_shape"), 2);
        assert_eq!(logger.failures_of("inference_failure"), 1);
        assert_eq!(logger.failures_of("degenerate_embedding"), 0);
    }

    #[test]
    fn test_summary_lists_stages_metrics_and_failures() {
        let mut logger = SummaryPipelineLogger::new(10);
        logger.progress(3, 3);
        logger.timing("inference", 12.0);
        logger.metric("embedding_distance", 0.002);
        logger.metric("embedding_distance", 0.004);
        logger.failure(2, "degenerate_distribution", "all zero");

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Classified 3 frames"));
        assert!(summary.contains("inference"));
        assert!(summary.contains("embedding_distance: mean 0.0030"));
        assert!(summary.contains("failed (degenerate_distribution): 1"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(SummaryPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_mean_of_metric() {
        let mut logger = SummaryPipelineLogger::default();
        logger.metric("embedding_distance", 1.0);
        logger.metric("embedding_distance", 2.0);
        assert_relative_eq!(mean(logger.metrics_for("embedding_distance").unwrap()), 1.5);
        assert_eq!(logger.throttle_frames, 10);
    }
}
