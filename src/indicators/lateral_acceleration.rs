// src/indicators/lateral_acceleration.rs
//
// Comfort check on ego lateral acceleration. Counts each new excursion of
// |a_lat| above the configured limit and plots the signal for the report.

use crate::detection::EdgeDetector;
use crate::indicator::{Indicator, IndicatorCore, IndicatorError, StepOutcome, VerdictText};
use crate::pipeline::{InitContext, StepContext, StopContext};
use crate::report::{PairData, ThresholdLine, XYPlot};
use tracing::{debug, info, warn};

pub const NAME: &str = "LateralAcceleration";

const DEFAULT_THRESHOLD: f64 = 2.0;

const TEXT: VerdictText = VerdictText {
    fail: "lateral acceleration too high",
    pass: "lateral acceleration check pass",
    skipped: "lateral acceleration check skipped",
};

fn new_plot(threshold: f64) -> XYPlot {
    let mut plot = XYPlot::new(
        "lateral acceleration",
        "t",
        "s",
        &["|lateral acceleration|"],
        &["m/s²"],
    )
    .with_description("ego lateral acceleration magnitude");
    if let Err(e) = plot.set_threshold(0, ThresholdLine::upper("lateral acceleration limit", threshold)) {
        warn!("⚠️  {}: {}", NAME, e);
    }
    plot
}

pub struct LateralAcceleration {
    core: IndicatorCore,
    threshold: f64,
    detector: EdgeDetector,
    plot: XYPlot,
    max_abs: f64,
}

impl Default for LateralAcceleration {
    fn default() -> Self {
        Self::new()
    }
}

impl LateralAcceleration {
    pub fn new() -> Self {
        Self {
            core: IndicatorCore::new(NAME, TEXT),
            threshold: DEFAULT_THRESHOLD,
            detector: EdgeDetector::rising(),
            plot: new_plot(DEFAULT_THRESHOLD),
            max_abs: 0.0,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn plot(&self) -> &XYPlot {
        &self.plot
    }
}

impl Indicator for LateralAcceleration {
    fn core(&self) -> &IndicatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut IndicatorCore {
        &mut self.core
    }

    fn detected_count(&self) -> u32 {
        self.detector.count()
    }

    fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), IndicatorError> {
        if !self.core.configure(ctx) {
            return Ok(());
        }
        self.threshold = self
            .core
            .threshold_or("LateralAccThreshold", DEFAULT_THRESHOLD);
        self.plot = new_plot(self.threshold);
        info!("✓ {} limit {:.2} m/s²", NAME, self.threshold);
        Ok(())
    }

    fn reset(&mut self) {
        self.detector.reset();
        self.plot.clear_samples();
        self.max_abs = 0.0;
        self.core.reset_case();
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> StepOutcome {
        if !self.core.is_enabled() {
            return StepOutcome::Disabled;
        }
        let ego = match ctx.ego() {
            Ok(ego) => ego,
            Err(reason) => return StepOutcome::NoData(reason),
        };

        let magnitude = ego.acceleration.lateral.abs();

        if self.detector.detect(magnitude, self.threshold) {
            debug!(
                "🚨 {} {:.2} m/s² > {:.2} at t={:.2}s",
                NAME, magnitude, self.threshold, ctx.sim_time_s
            );
        }
        self.max_abs = self.max_abs.max(magnitude);

        if self.core.is_reporting() {
            if let Err(e) = self.plot.append_sample(ctx.sim_time_s, &[magnitude]) {
                warn!("⚠️  {}: {}", NAME, e);
            }
        }
        StepOutcome::Evaluated
    }

    fn stop(&mut self, _ctx: &mut StopContext<'_>) -> bool {
        if !self.core.is_reporting() {
            return true;
        }
        let mean = self.plot.series(0).map_or(0.0, |axis| axis.mean());
        let plot = std::mem::replace(&mut self.plot, new_plot(self.threshold));

        self.core.attach(plot.seal());
        self.core
            .attach(PairData::metric("max lateral acceleration", self.max_abs, "m/s²"));
        self.core
            .attach(PairData::metric("mean lateral acceleration", mean, "m/s²"));
        true
    }
}
