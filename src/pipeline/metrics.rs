// src/pipeline/metrics.rs
//
// Run counters for the orchestrator. Reported alongside the test report
// and logged at stop.

use crate::indicator::StepOutcome;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct EvalMetrics {
    pub ticks: u64,
    pub evaluated_steps: u64,
    pub no_data_steps: u64,
    pub disabled_steps: u64,
    pub stop_requests: u64,
    pub step_time: Duration,
    pub started_at: Instant,
}

impl Default for EvalMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalMetrics {
    pub fn new() -> Self {
        Self {
            ticks: 0,
            evaluated_steps: 0,
            no_data_steps: 0,
            disabled_steps: 0,
            stop_requests: 0,
            step_time: Duration::ZERO,
            started_at: Instant::now(),
        }
    }

    pub fn record_outcome(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Evaluated => self.evaluated_steps += 1,
            StepOutcome::Disabled => self.disabled_steps += 1,
            StepOutcome::NoData(_) => self.no_data_steps += 1,
        }
    }

    pub fn ticks_per_sec(&self) -> f64 {
        let secs = self.step_time.as_secs_f64();
        if secs > 1e-6 {
            self.ticks as f64 / secs
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            ticks: self.ticks,
            evaluated_steps: self.evaluated_steps,
            no_data_steps: self.no_data_steps,
            disabled_steps: self.disabled_steps,
            stop_requests: self.stop_requests,
            ticks_per_sec: self.ticks_per_sec(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub ticks: u64,
    pub evaluated_steps: u64,
    pub no_data_steps: u64,
    pub disabled_steps: u64,
    pub stop_requests: u64,
    pub ticks_per_sec: f64,
    pub elapsed_secs: f64,
}
