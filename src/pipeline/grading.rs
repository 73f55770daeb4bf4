// src/pipeline/grading.rs
//
// Per-tick grading message. Each indicator writes its running count here
// once per step; the summary is what the simulator shows live while the
// scenario is still running.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedEvent {
    pub indicator: String,
    pub count: u32,
    pub sim_time_s: f64,
}

#[derive(Debug)]
pub struct GradingSummary {
    events: VecDeque<DetectedEvent>,
    max_pending: usize,
    counts: BTreeMap<String, u32>,
    cur_t_s: f64,
    dt_s: f64,
    event_detected: bool,
}

impl GradingSummary {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending.min(1024)),
            max_pending: max_pending.max(1),
            counts: BTreeMap::new(),
            cur_t_s: 0.0,
            dt_s: 0.0,
            event_detected: false,
        }
    }

    /// Stamp the new tick and clear the per-tick flag.
    pub fn begin_tick(&mut self, sim_time_s: f64) {
        self.dt_s = (sim_time_s - self.cur_t_s).max(0.0);
        self.cur_t_s = sim_time_s;
        self.event_detected = false;
    }

    /// Record an indicator's running count for this tick. Every call queues
    /// one event; a count above the last one seen raises the per-tick flag.
    pub fn record(&mut self, indicator: &str, count: u32) {
        let previous = self.counts.insert(indicator.to_string(), count).unwrap_or(0);
        if count > previous {
            self.event_detected = true;
            debug!("🚨 {} count {} → {} at t={:.2}s", indicator, previous, count, self.cur_t_s);
        }

        if self.events.len() >= self.max_pending {
            warn!(
                "Grading queue full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(DetectedEvent {
            indicator: indicator.to_string(),
            count,
            sim_time_s: self.cur_t_s,
        });
    }

    pub fn drain(&mut self) -> Vec<DetectedEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    pub fn event_detected(&self) -> bool {
        self.event_detected
    }

    pub fn cur_t_s(&self) -> f64 {
        self.cur_t_s
    }

    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    pub fn count(&self, indicator: &str) -> Option<u32> {
        self.counts.get(indicator).copied()
    }

    pub fn reset(&mut self) {
        self.events.clear();
        self.counts.clear();
        self.cur_t_s = 0.0;
        self.dt_s = 0.0;
        self.event_detected = false;
    }
}
