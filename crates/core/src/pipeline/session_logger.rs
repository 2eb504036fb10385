use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for live-session events.
///
/// Keeps the capture loop free of any particular output mechanism.
pub trait SessionLogger: Send {
    /// Called once per processed frame.
    fn frame(&mut self, index: usize);

    /// Record how long a named loop stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. detection age).
    fn metric(&mut self, name: &str, value: f64);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events. Used by tests and embedders with their own reporting.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame(&mut self, _index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
}

/// Count and sum of one stream of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct RunningTotal {
    count: usize,
    total: f64,
}

impl RunningTotal {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Tracks per-stage timing and metrics through the `log` facade and prints
/// a summary when the session ends.
///
/// Only running totals are kept. Frame progress is logged every `throttle_frames` frames.
pub struct StdoutSessionLogger {
    throttle_frames: usize,
    timings: HashMap<String, RunningTotal>,
    metrics: HashMap<String, RunningTotal>,
    start_time: Instant,
    frames: usize,
}

impl StdoutSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Session summary ({} frames, {:.1}s total):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = self.timings[stage];
            let total_ms = durations.total;
            let avg_ms = durations.mean();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.1}", self.metrics[name].mean()));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame(&mut self, index: usize) {
        self.frames += 1;
        if self.frames % self.throttle_frames == 0 {
            log::debug!("Processed {} frames (last index {index})", self.frames);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .add(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .add(value);
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
        let mut logger = NullSessionLogger;
        logger.frame(0);
        logger.timing("render", 5.0);
        logger.metric("detection_age_ms", 3.0);
        logger.summary();
    }

    #[test]
    fn test_timing_accumulates_per_stage() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.timing("render", 20.0);
        logger.timing("render", 30.0);
        logger.timing("segment", 5.0);

        assert_eq!(
            logger.timings["render"],
            RunningTotal {
                count: 2,
                total: 50.0
            }
        );
        assert_relative_eq!(logger.timings["segment"].mean(), 5.0);
        assert!(!logger.timings.contains_key("capture"));
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutSessionLogger::new(10);
        for i in 0..4 {
            logger.frame(i);
        }
        logger.timing("render", 10.0);
        logger.metric("detection_age_ms", 3.0);
        logger.metric("detection_age_ms", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Session summary (4 frames"));
        assert!(summary.contains("render"));
        assert!(summary.contains("detection_age_ms: avg 3.5"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutSessionLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_frame_counts() {
        let mut logger = StdoutSessionLogger::new(3);
        for i in 0..7 {
            logger.frame(i);
        }
        assert_eq!(logger.frames, 7);
    }

    #[test]
    fn test_running_total_mean() {
        let mut total = RunningTotal::default();
        assert_relative_eq!(total.mean(), 0.0);
        for v in [1.0, 2.0, 6.0] {
            total.add(v);
        }
        assert_relative_eq!(total.mean(), 3.0);
    }

    #[test]
    fn test_long_session_keeps_one_entry_per_stage() {
        let mut logger = StdoutSessionLogger::new(1000);
        for i in 0..10_000 {
            logger.frame(i);
            logger.timing("capture", 1.0);
            logger.timing("render", 2.0);
            logger.metric("detection_age_ms", 4.0);
        }
        assert_eq!(logger.timings.len(), 2);
        assert_eq!(logger.metrics.len(), 1);
        assert_eq!(logger.timings["render"].count, 10_000);
        assert_relative_eq!(logger.timings["render"].total, 20_000.0);
        assert_relative_eq!(logger.metrics["detection_age_ms"].mean(), 4.0);
    }
}
