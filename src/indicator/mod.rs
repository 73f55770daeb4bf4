// src/indicator/mod.rs
//
// Lifecycle every KPI indicator follows: Init once, Reset per scenario,
// Step per tick, Stop once at scenario end, then Verdict. The shared
// bookkeeping (definition, enabled flag, report case, verdict text) lives
// in IndicatorCore so concrete indicators only carry their own detection
// state.

mod verdict;

pub use verdict::{exceeds_condition, Verdict, VerdictState, VerdictText};

use crate::config::IndicatorDefinition;
use crate::pipeline::{GradingSummary, InitContext, StepContext, StopContext};
use crate::report::{ReportCase, ReportFragment};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// OUTCOMES
// ============================================================================

/// Why a step produced no evaluation. None of these mutate detection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataReason {
    MissingEgo,
    MissingMessage(&'static str),
    MalformedMessage(&'static str),
    /// The scenario is not in the phase this indicator evaluates.
    StageInactive,
    /// The configured target is not in this tick's data.
    UnknownTarget(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Evaluated,
    Disabled,
    NoData(NoDataReason),
}

impl StepOutcome {
    pub fn is_evaluated(&self) -> bool {
        matches!(self, Self::Evaluated)
    }
}

impl From<NoDataReason> for StepOutcome {
    fn from(reason: NoDataReason) -> Self {
        Self::NoData(reason)
    }
}

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("{indicator}: required threshold '{key}' is missing")]
    MissingThreshold { indicator: String, key: String },

    #[error("{indicator}: threshold '{key}' has unusable value '{value}'")]
    InvalidThreshold {
        indicator: String,
        key: String,
        value: String,
    },
}

// ============================================================================
// SHARED STATE
// ============================================================================

#[derive(Debug)]
pub struct IndicatorCore {
    name: &'static str,
    text: VerdictText,
    definition: Option<IndicatorDefinition>,
    enabled: bool,
    report_enabled: bool,
    case: ReportCase,
}

impl IndicatorCore {
    pub fn new(name: &'static str, text: VerdictText) -> Self {
        Self {
            name,
            text,
            definition: None,
            enabled: false,
            report_enabled: true,
            case: ReportCase::new(name),
        }
    }

    /// Pull this indicator's definition from the config. Returns whether
    /// the indicator is enabled.
    pub fn configure(&mut self, ctx: &InitContext<'_>) -> bool {
        self.definition = ctx.config.definition(self.name).cloned();
        self.report_enabled = ctx.report_enabled;

        match &self.definition {
            Some(def) => {
                self.enabled = def.enabled;
                self.case = ReportCase::from_definition(def);
            }
            None => {
                warn!("⚠️  {} has no configuration entry, disabling", self.name);
                self.enabled = false;
                self.case = ReportCase::new(self.name);
            }
        }

        if !self.enabled {
            info!("{} disabled", self.name);
        }
        self.enabled
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enabled and allowed to write report fragments.
    pub fn is_reporting(&self) -> bool {
        self.enabled && self.report_enabled
    }

    pub fn definition(&self) -> Option<&IndicatorDefinition> {
        self.definition.as_ref()
    }

    /// Numeric threshold, or `default` (with a warning) when it is missing
    /// or not a number.
    pub fn threshold_or(&self, key: &str, default: f64) -> f64 {
        let value = self.definition.as_ref().and_then(|d| d.thresholds.get(key));
        match value.map(|v| (v, v.as_f64())) {
            Some((_, Some(x))) => x,
            Some((raw, None)) => {
                warn!(
                    "⚠️  {}: threshold {}='{}' is not numeric, using default {}",
                    self.name,
                    key,
                    raw.as_text(),
                    default
                );
                default
            }
            None => {
                warn!(
                    "⚠️  {}: threshold {} not set, using default {}",
                    self.name, key, default
                );
                default
            }
        }
    }

    /// Threshold that has no sensible default.
    pub fn required_threshold(&self, key: &str) -> Result<f64, IndicatorError> {
        let raw = self
            .definition
            .as_ref()
            .and_then(|d| d.thresholds.get(key))
            .ok_or_else(|| IndicatorError::MissingThreshold {
                indicator: self.name.to_string(),
                key: key.to_string(),
            })?;
        raw.as_f64().ok_or_else(|| IndicatorError::InvalidThreshold {
            indicator: self.name.to_string(),
            key: key.to_string(),
            value: raw.as_text(),
        })
    }

    pub fn pass_condition(&self) -> f64 {
        self.definition.as_ref().map_or(0.0, |d| d.pass_condition)
    }

    pub fn finish_condition(&self) -> f64 {
        self.definition.as_ref().map_or(0.0, |d| d.finish_condition)
    }

    /// Attach a fragment to this run's case. Dropped when not reporting.
    pub fn attach(&mut self, fragment: impl Into<ReportFragment>) {
        if self.is_reporting() {
            self.case.attach(fragment);
        }
    }

    pub fn case(&self) -> &ReportCase {
        &self.case
    }

    pub fn case_mut(&mut self) -> &mut ReportCase {
        &mut self.case
    }

    pub fn verdict(&self, count: u32) -> Verdict {
        let (state, reason) = if !self.enabled {
            (VerdictState::Skipped, self.text.skipped)
        } else if exceeds_condition(count, self.pass_condition()) {
            (VerdictState::Fail, self.text.fail)
        } else {
            (VerdictState::Pass, self.text.pass)
        };
        Verdict {
            state,
            reason: reason.to_string(),
            detected_count: count,
        }
    }

    /// Evaluate the finish condition and record it on the case.
    pub fn stop_request(&mut self, count: u32) -> Option<String> {
        let finish = self.finish_condition();
        let stop = self.enabled && exceeds_condition(count, finish);
        self.case.info.request_stop = stop;
        stop.then(|| self.text.fail.to_string())
    }

    /// Hand over the finished case and start a fresh one for the next run.
    pub fn take_case(&mut self) -> ReportCase {
        let fresh = self.fresh_case();
        std::mem::replace(&mut self.case, fresh)
    }

    pub fn reset_case(&mut self) {
        self.case = self.fresh_case();
    }

    fn fresh_case(&self) -> ReportCase {
        match &self.definition {
            Some(def) => ReportCase::from_definition(def),
            None => ReportCase::new(self.name),
        }
    }
}

// ============================================================================
// LIFECYCLE CONTRACT
// ============================================================================

pub trait Indicator {
    fn core(&self) -> &IndicatorCore;
    fn core_mut(&mut self) -> &mut IndicatorCore;

    /// Running count of detected events this scenario.
    fn detected_count(&self) -> u32;

    /// Read thresholds and build plots. Errors only on configuration the
    /// indicator cannot run without.
    fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), IndicatorError>;

    /// Clear per-scenario state. Configuration survives.
    fn reset(&mut self);

    fn step(&mut self, ctx: &StepContext<'_>) -> StepOutcome;

    /// Finalize plots and write fragments. False when finalization failed.
    fn stop(&mut self, ctx: &mut StopContext<'_>) -> bool;

    fn name(&self) -> &'static str {
        self.core().name()
    }

    fn verdict(&self) -> Verdict {
        self.core().verdict(self.detected_count())
    }

    fn should_stop_scenario(&mut self) -> Option<String> {
        let count = self.detected_count();
        self.core_mut().stop_request(count)
    }

    fn set_grading_summary(&self, summary: &mut GradingSummary) {
        if self.core().is_enabled() {
            summary.record(self.name(), self.detected_count());
        }
    }

    fn take_case(&mut self) -> ReportCase {
        self.core_mut().take_case()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EvalConfig, IndicatorDefinition, ThresholdValue};
    use crate::report::PairData;

    const TEXT: VerdictText = VerdictText {
        fail: "too many ticks",
        pass: "ok",
        skipped: "Tick check skipped",
    };

    /// Counts every evaluated tick.
    struct TickCounter {
        core: IndicatorCore,
        count: u32,
    }

    impl TickCounter {
        fn new() -> Self {
            Self {
                core: IndicatorCore::new("TickCounter", TEXT),
                count: 0,
            }
        }
    }

    impl Indicator for TickCounter {
        fn core(&self) -> &IndicatorCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut IndicatorCore {
            &mut self.core
        }
        fn detected_count(&self) -> u32 {
            self.count
        }
        fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), IndicatorError> {
            self.core.configure(ctx);
            Ok(())
        }
        fn reset(&mut self) {
            self.count = 0;
            self.core.reset_case();
        }
        fn step(&mut self, _ctx: &StepContext<'_>) -> StepOutcome {
            if !self.core.is_enabled() {
                return StepOutcome::Disabled;
            }
            self.count += 1;
            StepOutcome::Evaluated
        }
        fn stop(&mut self, _ctx: &mut StopContext<'_>) -> bool {
            let count = self.count;
            self.core.attach(PairData::new("ticks", count.to_string()));
            true
        }
    }

    fn config_with(def: IndicatorDefinition) -> EvalConfig {
        EvalConfig {
            kpis: vec![def],
            ..EvalConfig::default()
        }
    }

    #[test]
    fn test_verdict_follows_pass_condition() {
        let cfg = config_with(
            IndicatorDefinition::new("TickCounter")
                .with_pass_condition(2.0)
                .with_finish_condition(3.0),
        );
        let mut ind = TickCounter::new();
        ind.init(&InitContext::new(&cfg)).unwrap();

        ind.count = 1;
        assert_eq!(ind.verdict().state, VerdictState::Pass);
        assert_eq!(ind.should_stop_scenario(), None);
        assert!(!ind.core().case().info.request_stop);

        ind.count = 3;
        let v = ind.verdict();
        assert_eq!(v.state, VerdictState::Fail);
        assert_eq!(v.reason, "too many ticks");
        assert_eq!(v.detected_count, 3);
        assert!(ind.should_stop_scenario().is_some());
        assert!(ind.core().case().info.request_stop);
    }

    #[test]
    fn test_unconfigured_indicator_is_skipped() {
        let cfg = EvalConfig::default();
        let mut ind = TickCounter::new();
        ind.init(&InitContext::new(&cfg)).unwrap();
        ind.count = 100;

        let v = ind.verdict();
        assert_eq!(v.state, VerdictState::Skipped);
        assert_eq!(v.reason, "Tick check skipped");
        assert_eq!(ind.should_stop_scenario(), None);
    }

    #[test]
    fn test_threshold_defaults() {
        let cfg = config_with(
            IndicatorDefinition::new("TickCounter")
                .with_threshold("Limit", ThresholdValue::Number(4.0))
                .with_threshold("Name", ThresholdValue::Text("abc".into())),
        );
        let mut core = IndicatorCore::new("TickCounter", TEXT);
        core.configure(&InitContext::new(&cfg));

        assert_eq!(core.threshold_or("Limit", 1.0), 4.0);
        assert_eq!(core.threshold_or("Missing", 1.0), 1.0);
        assert_eq!(core.threshold_or("Name", 2.5), 2.5);
        assert!(matches!(
            core.required_threshold("Missing"),
            Err(IndicatorError::MissingThreshold { .. })
        ));
        assert!(matches!(
            core.required_threshold("Name"),
            Err(IndicatorError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_report_disabled_drops_fragments() {
        let cfg = config_with(IndicatorDefinition::new("TickCounter"));
        let mut core = IndicatorCore::new("TickCounter", TEXT);
        core.configure(&InitContext::new(&cfg).with_report(false));
        core.attach(PairData::new("a", "1"));
        assert!(core.case().fragments().is_empty());

        let taken = core.take_case();
        assert_eq!(taken.info.indicator, "TickCounter");
        assert!(core.case().fragments().is_empty());
    }
}
