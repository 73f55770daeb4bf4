// src/pipeline/orchestrator.rs
//
// Drives the configured indicators through one scenario and folds their
// verdicts into the run result. Indicators are independent: one that
// fails to build or init is logged and left out, the rest keep running.

use super::context::{InitContext, StepContext, StopContext};
use super::grading::{DetectedEvent, GradingSummary};
use super::metrics::{EvalMetrics, MetricsSummary};
use crate::config::EvalConfig;
use crate::indicator::{Indicator, StepOutcome, Verdict, VerdictState};
use crate::registry::{IndicatorRegistry, RegistryError};
use crate::report::TestReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvalPhase {
    Constructed,
    Initialized,
    Running,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("cannot {action} while {phase:?}")]
    Phase {
        action: &'static str,
        phase: EvalPhase,
    },
}

/// Result of one tick across all indicators.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub evaluated: usize,
    pub events: Vec<DetectedEvent>,
    /// Set when any indicator asked to end the scenario.
    pub stop_request: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorVerdict {
    pub indicator: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalOutcome {
    pub passed: bool,
    pub reason: String,
    pub verdicts: Vec<IndicatorVerdict>,
    pub report: TestReport,
    pub metrics: MetricsSummary,
}

pub struct EvalOrchestrator {
    config: EvalConfig,
    indicators: Vec<Box<dyn Indicator>>,
    build_errors: Vec<RegistryError>,
    grading: GradingSummary,
    metrics: EvalMetrics,
    phase: EvalPhase,
    scenario_name: String,
    sim_time_s: f64,
    early_stop: Option<String>,
}

impl EvalOrchestrator {
    /// Build one instance per configured indicator. Names the registry
    /// does not know are skipped with a warning.
    pub fn new(registry: &IndicatorRegistry, config: EvalConfig) -> Self {
        let mut indicators = Vec::new();
        let mut build_errors = Vec::new();

        for kpi in &config.kpis {
            match registry.build(&kpi.name) {
                Ok(indicator) => indicators.push(indicator),
                Err(e) => {
                    warn!("⚠️  {}", e);
                    build_errors.push(e);
                }
            }
        }

        let grading = GradingSummary::new(config.settings.grading_queue_capacity);
        Self {
            config,
            indicators,
            build_errors,
            grading,
            metrics: EvalMetrics::new(),
            phase: EvalPhase::Constructed,
            scenario_name: String::new(),
            sim_time_s: 0.0,
            early_stop: None,
        }
    }

    pub fn phase(&self) -> EvalPhase {
        self.phase
    }

    pub fn indicator_names(&self) -> Vec<&'static str> {
        self.indicators.iter().map(|i| i.name()).collect()
    }

    pub fn build_errors(&self) -> &[RegistryError] {
        &self.build_errors
    }

    pub fn grading(&self) -> &GradingSummary {
        &self.grading
    }

    pub fn init(&mut self) -> Result<(), EvalError> {
        self.expect_phase("init", &[EvalPhase::Constructed])?;

        let ctx = InitContext::new(&self.config).with_report(self.config.settings.report_enabled);
        self.indicators.retain_mut(|indicator| match indicator.init(&ctx) {
            Ok(()) => true,
            Err(e) => {
                error!("❌ Init failed, dropping indicator: {}", e);
                false
            }
        });

        info!(
            "✓ Evaluation initialized with {} indicators: {:?}",
            self.indicators.len(),
            self.indicator_names()
        );
        self.phase = EvalPhase::Initialized;
        Ok(())
    }

    /// Start a scenario. Allowed after init and after a previous stop.
    pub fn reset(&mut self, scenario_name: &str) -> Result<(), EvalError> {
        self.expect_phase("reset", &[EvalPhase::Initialized, EvalPhase::Stopped])?;

        for indicator in &mut self.indicators {
            indicator.reset();
        }
        self.grading.reset();
        self.metrics = EvalMetrics::new();
        self.scenario_name = scenario_name.to_string();
        self.sim_time_s = 0.0;
        self.early_stop = None;
        self.phase = EvalPhase::Running;

        info!("🔧 Scenario '{}' started", scenario_name);
        Ok(())
    }

    /// Step every indicator once. A stop request is reported only after
    /// the whole tick has been evaluated.
    pub fn step(&mut self, ctx: &StepContext<'_>) -> Result<TickReport, EvalError> {
        self.expect_phase("step", &[EvalPhase::Running])?;

        let started = Instant::now();
        self.sim_time_s = ctx.sim_time_s;
        self.grading.begin_tick(ctx.sim_time_s);
        self.metrics.ticks += 1;

        let mut report = TickReport::default();
        let mut stop_reasons = Vec::new();

        for indicator in &mut self.indicators {
            let outcome = indicator.step(ctx);
            self.metrics.record_outcome(&outcome);
            match &outcome {
                StepOutcome::Evaluated => report.evaluated += 1,
                StepOutcome::NoData(reason) => {
                    debug!("{} no data at t={:.2}s: {:?}", indicator.name(), ctx.sim_time_s, reason);
                }
                StepOutcome::Disabled => {}
            }

            indicator.set_grading_summary(&mut self.grading);

            if let Some(reason) = indicator.should_stop_scenario() {
                stop_reasons.push(reason);
            }
        }

        report.events = self.grading.drain();

        if !stop_reasons.is_empty() {
            let reason = stop_reasons.join(";");
            warn!("🚨 Stop requested at t={:.2}s: {}", ctx.sim_time_s, reason);
            self.metrics.stop_requests += 1;
            if self.early_stop.is_none() {
                self.early_stop = Some(reason.clone());
            }
            report.stop_request = Some(reason);
        }

        self.metrics.step_time += started.elapsed();
        Ok(report)
    }

    /// Finalize every indicator and fold verdicts. The run passes only
    /// when no indicator failed; skipped indicators do not count.
    pub fn stop(&mut self) -> Result<EvalOutcome, EvalError> {
        self.expect_phase("stop", &[EvalPhase::Running])?;

        let report_enabled = self.config.settings.report_enabled;
        let mut feedback = BTreeMap::new();
        let mut report = TestReport::new(&self.scenario_name);
        let mut verdicts = Vec::new();
        let mut fail_reasons = Vec::new();

        for indicator in &mut self.indicators {
            let name = indicator.name();
            {
                let mut stop_ctx = StopContext::new(self.sim_time_s, &mut feedback);
                if !indicator.stop(&mut stop_ctx) {
                    error!("❌ {} failed to finalize its report", name);
                }
            }

            let verdict = indicator.verdict();
            let score = indicator
                .core()
                .definition()
                .and_then(|d| d.score_map.as_ref())
                .and_then(|m| m.lookup(f64::from(verdict.detected_count)));

            let mut case = indicator.take_case();
            case.info.detected_count = verdict.detected_count;
            case.set_result(verdict.state, &verdict.reason, score);

            match verdict.state {
                VerdictState::Fail => {
                    warn!("❌ {} FAIL: {}", name, verdict.reason);
                    fail_reasons.push(verdict.reason.clone());
                }
                VerdictState::Pass => info!("✓ {} PASS", name),
                VerdictState::Skipped => info!("{} skipped", name),
            }

            if report_enabled {
                report.add_case(case);
            }
            verdicts.push(IndicatorVerdict {
                indicator: name.to_string(),
                verdict,
            });
        }

        let passed = fail_reasons.is_empty();
        let reason = fail_reasons.join(";");

        report.passed = passed;
        report.reason = reason.clone();
        report.total_sim_time_s = self.sim_time_s;
        report.early_stop = self.early_stop.clone();
        report.feedback = feedback;

        let metrics = self.metrics.summary();
        info!(
            "Scenario '{}' {} after {} ticks ({:.1} ticks/s)",
            self.scenario_name,
            if passed { "PASSED" } else { "FAILED" },
            metrics.ticks,
            metrics.ticks_per_sec
        );

        self.phase = EvalPhase::Stopped;
        Ok(EvalOutcome {
            passed,
            reason,
            verdicts,
            report,
            metrics,
        })
    }

    fn expect_phase(&self, action: &'static str, allowed: &[EvalPhase]) -> Result<(), EvalError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(EvalError::Phase {
                action,
                phase: self.phase,
            })
        }
    }
}
