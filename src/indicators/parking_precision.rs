// src/indicators/parking_precision.rs
//
// Final-pose precision once the parking manoeuvre reports completed:
// per-wheel margin to the space's long edges, front/rear margin to its
// short edges, and body yaw offset against the space heading. Each of the
// seven measures has its own rising detector; the detected count is their sum.

use crate::detection::{EdgeDetector, StageGate, StageTransition};
use crate::geometry::{point_in_polygon, point_to_segment_distance, yaw_diff, Vec2};
use crate::indicator::{
    Indicator, IndicatorCore, IndicatorError, NoDataReason, StepOutcome, VerdictText,
};
use crate::map::parking_space_to_local;
use crate::messages::{topic, ParkingSpaceMsg, ParkingStage, ParkingStateMsg};
use crate::pipeline::{InitContext, StepContext, StopContext};
use crate::report::PairData;
use crate::types::{ActorState, ParkingSpace};
use serde::Serialize;
use tracing::{debug, info};

pub const NAME: &str = "ParkingPrecision";

const TEXT: VerdictText = VerdictText {
    fail: "imprecise parking",
    pass: "parking precision check pass",
    skipped: "parking precision check skipped",
};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionThresholds {
    /// Wheel to long edge, metres.
    pub lateral_m: f64,
    /// Axle midpoint to short edge, metres.
    pub vertical_m: f64,
    pub body_angle_deg: f64,
}

impl Default for PrecisionThresholds {
    fn default() -> Self {
        Self {
            lateral_m: 0.3,
            vertical_m: 0.3,
            body_angle_deg: 3.0,
        }
    }
}

// ============================================================================
// MEASUREMENT
// ============================================================================

const MEASURES: usize = 7;

const LABELS: [(&str, &str); MEASURES] = [
    ("front-left wheel lateral precision", "m"),
    ("front-right wheel lateral precision", "m"),
    ("rear-right wheel lateral precision", "m"),
    ("rear-left wheel lateral precision", "m"),
    ("front longitudinal precision", "m"),
    ("rear longitudinal precision", "m"),
    ("body angle", "°"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PrecisionSample {
    pub lateral_fl: f64,
    pub lateral_fr: f64,
    pub lateral_rr: f64,
    pub lateral_rl: f64,
    pub vertical_front: f64,
    pub vertical_rear: f64,
    pub body_angle_deg: f64,
    pub out_of_space: bool,
}

impl PrecisionSample {
    pub fn measure(ego: &ActorState, space: &ParkingSpace) -> Self {
        let [fl, fr, rr, rl] = ego.wheel_positions();
        let (lt, lb, rt, rb) = (
            space.left_top,
            space.left_bottom,
            space.right_top,
            space.right_bottom,
        );

        // (long edges, short edges)
        let (sides, ends) = if space.is_long_axis_top_bottom() {
            ([(lt, lb), (rt, rb)], [(lt, rt), (lb, rb)])
        } else {
            ([(lt, rt), (lb, rb)], [(lt, lb), (rt, rb)])
        };
        let nearest = |edges: &[(Vec2, Vec2); 2], p: Vec2| {
            edges
                .iter()
                .map(|(a, b)| point_to_segment_distance(*a, *b, p))
                .fold(f64::INFINITY, f64::min)
        };

        // A car reversed into the space is as aligned as one driven in.
        let angle = yaw_diff(space.yaw, ego.pose.yaw).abs().to_degrees();
        let body_angle_deg = angle.min(180.0 - angle);

        let outline = space.outline();
        let out_of_space = [fl, fr, rr, rl]
            .iter()
            .any(|c| !point_in_polygon(*c, &outline));

        Self {
            lateral_fl: nearest(&sides, fl),
            lateral_fr: nearest(&sides, fr),
            lateral_rr: nearest(&sides, rr),
            lateral_rl: nearest(&sides, rl),
            vertical_front: nearest(&ends, fl.midpoint(fr)),
            vertical_rear: nearest(&ends, rr.midpoint(rl)),
            body_angle_deg,
            out_of_space,
        }
    }

    fn values(&self) -> [f64; MEASURES] {
        [
            self.lateral_fl,
            self.lateral_fr,
            self.lateral_rr,
            self.lateral_rl,
            self.vertical_front,
            self.vertical_rear,
            self.body_angle_deg,
        ]
    }
}

// ============================================================================
// INDICATOR
// ============================================================================

pub struct ParkingPrecision {
    core: IndicatorCore,
    space_id: i64,
    thresholds: PrecisionThresholds,
    gate: StageGate<ParkingStage>,
    detectors: [EdgeDetector; MEASURES],
    maxima: [f64; MEASURES],
    out_of_space: bool,
}

impl Default for ParkingPrecision {
    fn default() -> Self {
        Self::new()
    }
}

impl ParkingPrecision {
    pub fn new() -> Self {
        Self {
            core: IndicatorCore::new(NAME, TEXT),
            space_id: 0,
            thresholds: PrecisionThresholds::default(),
            gate: StageGate::new(ParkingStage::Completed),
            detectors: std::array::from_fn(|_| EdgeDetector::rising()),
            maxima: [0.0; MEASURES],
            out_of_space: false,
        }
    }

    pub fn thresholds(&self) -> PrecisionThresholds {
        self.thresholds
    }

    pub fn maxima(&self) -> [f64; MEASURES] {
        self.maxima
    }

    pub fn out_of_space(&self) -> bool {
        self.out_of_space
    }

    fn limits(&self) -> [f64; MEASURES] {
        let t = self.thresholds;
        [
            t.lateral_m,
            t.lateral_m,
            t.lateral_m,
            t.lateral_m,
            t.vertical_m,
            t.vertical_m,
            t.body_angle_deg,
        ]
    }

    fn clear_stage_scope(&mut self) {
        self.maxima = [0.0; MEASURES];
        self.out_of_space = false;
    }

    fn evaluate(&mut self, ctx: &StepContext<'_>) -> Result<(), NoDataReason> {
        let state: ParkingStateMsg = ctx.decode(topic::PARKING_STATE)?;
        let spaces: ParkingSpaceMsg = ctx.decode(topic::PARKING_SPACE)?;
        let ego = ctx.ego()?;
        let space = spaces
            .spaces
            .iter()
            .find(|s| s.id == self.space_id)
            .ok_or_else(|| NoDataReason::UnknownTarget(format!("parking space {}", self.space_id)))?;

        // Inputs are complete from here on; the gate may move.
        match self.gate.observe(&state.stage) {
            StageTransition::Left => {
                self.clear_stage_scope();
                return Err(NoDataReason::StageInactive);
            }
            StageTransition::Inactive => return Err(NoDataReason::StageInactive),
            StageTransition::Entered | StageTransition::Active => {}
        }

        let space = parking_space_to_local(ctx.map, space);

        let sample = PrecisionSample::measure(ego, &space);
        debug!("{} t={:.2}s {:?}", NAME, ctx.sim_time_s, sample);

        let limits = self.limits();
        for (i, value) in sample.values().into_iter().enumerate() {
            self.detectors[i].detect(value, limits[i]);
            self.maxima[i] = self.maxima[i].max(value);
        }
        self.out_of_space |= sample.out_of_space;
        Ok(())
    }
}

impl Indicator for ParkingPrecision {
    fn core(&self) -> &IndicatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut IndicatorCore {
        &mut self.core
    }

    fn detected_count(&self) -> u32 {
        self.detectors.iter().map(EdgeDetector::count).sum()
    }

    fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), IndicatorError> {
        if !self.core.configure(ctx) {
            return Ok(());
        }

        self.space_id = self.core.required_threshold("ParkingSpaceId")?.round() as i64;
        let defaults = PrecisionThresholds::default();
        self.thresholds = PrecisionThresholds {
            lateral_m: self.core.threshold_or("LateralThreshold", defaults.lateral_m),
            vertical_m: self.core.threshold_or("VerticalThreshold", defaults.vertical_m),
            body_angle_deg: self.core.threshold_or("BodyAngleThreshold", defaults.body_angle_deg),
        };

        info!(
            "✓ {} watching space {} (lateral {:.2}m, vertical {:.2}m, angle {:.1}°)",
            NAME,
            self.space_id,
            self.thresholds.lateral_m,
            self.thresholds.vertical_m,
            self.thresholds.body_angle_deg
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.gate.reset();
        for d in &mut self.detectors {
            d.reset();
        }
        self.clear_stage_scope();
        self.core.reset_case();
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> StepOutcome {
        if !self.core.is_enabled() {
            return StepOutcome::Disabled;
        }
        match self.evaluate(ctx) {
            Ok(()) => StepOutcome::Evaluated,
            Err(reason) => StepOutcome::NoData(reason),
        }
    }

    fn stop(&mut self, _ctx: &mut StopContext<'_>) -> bool {
        if !self.core.is_reporting() {
            return true;
        }
        for ((label, unit), value) in LABELS.iter().zip(self.maxima) {
            self.core.attach(PairData::metric(*label, value, unit));
        }
        let out = if self.out_of_space { "yes" } else { "no" };
        self.core.attach(PairData::new("wheel outside parking space", out));
        true
    }
}
