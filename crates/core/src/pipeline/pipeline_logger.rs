use std::collections::HashMap;
use std::time::Instant;

use crate::shared::error::Stage;

/// Metric the face orchestrator reports once per call.
pub const DETECTED_FACES_METRIC: &str = "detected_faces";

/// Observer for orchestration events: stage timings, per-call metrics and
/// enrollment progress.
pub trait PipelineLogger: Send {
    /// Samples accepted so far out of the number a workflow needs.
    fn progress(&mut self, current: usize, total: usize);

    fn timing(&mut self, stage: Stage, duration_ms: f64);

    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: Stage, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub runs: usize,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    fn record(&mut self, duration_ms: f64) {
        self.runs += 1;
        self.total_ms += duration_ms;
        self.max_ms = self.max_ms.max(duration_ms);
    }

    pub fn mean_ms(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.total_ms / self.runs as f64
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MetricStats {
    count: usize,
    sum: f64,
}

/// Aggregates stage timings and metrics in memory and reports them through
/// the `log` facade.
pub struct StdoutPipelineLogger {
    stages: HashMap<Stage, StageStats>,
    metrics: HashMap<String, MetricStats>,
    started: Instant,
    messages: usize,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
            metrics: HashMap::new(),
            started: Instant::now(),
            messages: 0,
        }
    }

    pub fn stage_stats(&self, stage: Stage) -> Option<StageStats> {
        self.stages.get(&stage).copied()
    }

    pub fn metric_mean(&self, name: &str) -> Option<f64> {
        self.metrics
            .get(name)
            .filter(|m| m.count > 0)
            .map(|m| m.sum / m.count as f64)
    }

    /// `None` until something has been timed or measured.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let mut out = format!(
            "Sensing summary after {:.1}s ({} status messages):",
            self.started.elapsed().as_secs_f64(),
            self.messages
        );

        let mut stages: Vec<(&Stage, &StageStats)> = self.stages.iter().collect();
        stages.sort_by_key(|(stage, _)| stage.as_str());
        for (stage, stats) in stages {
            out.push_str(&format!(
                "\n  {:<14} {:>5} runs  mean {:>7.2}ms  max {:>7.2}ms",
                stage.as_str(),
                stats.runs,
                stats.mean_ms(),
                stats.max_ms
            ));
        }

        let mut names: Vec<&String> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            if let Some(mean) = self.metric_mean(name) {
                out.push_str(&format!("\n  {name}: mean {mean:.2}"));
            }
        }
        Some(out)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        if total > 0 {
            log::info!("Accepted {current} of {total} samples");
        }
    }

    fn timing(&mut self, stage: Stage, duration_ms: f64) {
        self.stages.entry(stage).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        let m = self.metrics.entry(name.to_string()).or_default();
        m.count += 1;
        m.sum += value;
    }

    fn info(&mut self, message: &str) {
        self.messages += 1;
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
