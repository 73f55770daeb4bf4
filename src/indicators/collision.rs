// src/indicators/collision.rs
//
// Ego footprint contact with fellow actors and nearby map objects.
// One event per contact episode; a contact is classified by what was hit
// and, for vehicles, by the relative heading at impact.

use crate::detection::EdgeDetector;
use crate::geometry::{polygons_overlap, yaw_diff};
use crate::indicator::{Indicator, IndicatorCore, IndicatorError, StepOutcome, VerdictText};
use crate::map::{MapAccess, MapObjectKind};
use crate::pipeline::{InitContext, StepContext, StopContext};
use crate::report::{PairData, ThresholdLine, XYPlot};
use crate::types::{ActorKind, ActorSnapshot, ActorState};
use serde::Serialize;
use tracing::{info, warn};

pub const NAME: &str = "Collision";

pub const FEEDBACK_KEY: &str = "Collision";

const TEXT: VerdictText = VerdictText {
    fail: "collision occurred",
    pass: "no collision",
    skipped: "collision check skipped",
};

/// Ego braking harder than this during contact counts as a response.
const RESPONSE_DECEL: f64 = -1.0;

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollisionKind {
    DynamicActor,
    RearEnd,
    RearEnded,
    Vertical,
    Frontal,
    Bevel,
    StaticActor,
    MapObject,
}

impl CollisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DynamicActor => "collision with dynamic actor",
            Self::RearEnd => "car and car - rear end",
            Self::RearEnded => "car and car - rear ended",
            Self::Vertical => "car and car - vertical",
            Self::Frontal => "car and car - frontal",
            Self::Bevel => "car and car - bevel",
            Self::StaticActor => "static obstacle collision",
            Self::MapObject => "collision with map object",
        }
    }

    /// Vehicle-vehicle contact by relative heading. Near-parallel contacts
    /// are split by which car is in front.
    pub fn between_vehicles(ego: &ActorState, other: &ActorState) -> Self {
        let angle = yaw_diff(ego.pose.yaw, other.pose.yaw).abs().to_degrees();
        if angle < 15.0 {
            if ego.to_body_frame(other.position()).x > 0.0 {
                Self::RearEnd
            } else {
                Self::RearEnded
            }
        } else if (75.0..105.0).contains(&angle) {
            Self::Vertical
        } else if angle > 165.0 {
            Self::Frontal
        } else {
            Self::Bevel
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub kind: CollisionKind,
    /// Actor or map object id.
    pub other_id: i64,
}

/// First contact found: dynamic actors and pedestrians, then vehicles,
/// then static actors, then map objects.
pub fn find_contact(ego: &ActorState, actors: &ActorSnapshot, map: &dyn MapAccess) -> Option<Contact> {
    let footprint = ego.footprint();
    let touches = |other: &ActorState| polygons_overlap(&footprint, &other.footprint());

    let mut moving = actors
        .fellows
        .iter()
        .filter(|a| matches!(a.kind, ActorKind::Dynamic | ActorKind::Pedestrian));
    if let Some(a) = moving.find(|&a| touches(a)) {
        return Some(Contact {
            kind: CollisionKind::DynamicActor,
            other_id: a.id,
        });
    }

    if let Some(a) = actors.fellows_of(ActorKind::Vehicle).find(|&a| touches(a)) {
        return Some(Contact {
            kind: CollisionKind::between_vehicles(ego, a),
            other_id: a.id,
        });
    }

    if let Some(a) = actors.fellows_of(ActorKind::Static).find(|&a| touches(a)) {
        return Some(Contact {
            kind: CollisionKind::StaticActor,
            other_id: a.id,
        });
    }

    MapObjectKind::COLLIDABLE.iter().find_map(|kind| {
        map.nearby_objects(*kind, ego.position(), kind.default_search_radius())
            .into_iter()
            .find(|o| polygons_overlap(&footprint, &o.outline))
            .map(|o| Contact {
                kind: CollisionKind::MapObject,
                other_id: o.id as i64,
            })
    })
}

// ============================================================================
// INDICATOR
// ============================================================================

fn new_plot() -> XYPlot {
    let mut plot = XYPlot::new(
        "collision",
        "t",
        "s",
        &["collision", "no response"],
        &["N/A", "N/A"],
    );
    for i in 0..2 {
        if let Err(e) = plot.set_threshold(i, ThresholdLine::upper("thresh upper", 1.0).closed()) {
            warn!("⚠️  {}: {}", NAME, e);
        }
    }
    plot
}

pub struct Collision {
    core: IndicatorCore,
    detector: EdgeDetector,
    plot: XYPlot,
    last_contact: Option<Contact>,
    unanswered: u32,
}

impl Default for Collision {
    fn default() -> Self {
        Self::new()
    }
}

impl Collision {
    pub fn new() -> Self {
        Self {
            core: IndicatorCore::new(NAME, TEXT),
            detector: EdgeDetector::rising(),
            plot: new_plot(),
            last_contact: None,
            unanswered: 0,
        }
    }

    pub fn last_contact(&self) -> Option<&Contact> {
        self.last_contact.as_ref()
    }
}

impl Indicator for Collision {
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
        if self.core.configure(ctx) {
            info!("✓ {} enabled", NAME);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.detector.reset();
        self.plot.clear_samples();
        self.last_contact = None;
        self.unanswered = 0;
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

        let contact = find_contact(ego, ctx.actors, ctx.map);
        let colliding = contact.is_some();
        let no_response = colliding && ego.acceleration.longitudinal > RESPONSE_DECEL;

        if self.detector.detect_flag(colliding) {
            if let Some(c) = &contact {
                warn!(
                    "🚨 {} with id {} at t={:.2}s ({:.1}, {:.1})",
                    c.kind.as_str(),
                    c.other_id,
                    ctx.sim_time_s,
                    ego.position().x,
                    ego.position().y
                );
            }
            if no_response {
                self.unanswered += 1;
            }
        }
        if contact.is_some() {
            self.last_contact = contact;
        }

        if self.core.is_reporting() {
            let sample = [f64::from(u8::from(colliding)), f64::from(u8::from(no_response))];
            if let Err(e) = self.plot.append_sample(ctx.sim_time_s, &sample) {
                warn!("⚠️  {}: {}", NAME, e);
            }
        }
        StepOutcome::Evaluated
    }

    fn stop(&mut self, ctx: &mut StopContext<'_>) -> bool {
        if !self.core.is_enabled() {
            return true;
        }
        ctx.set_feedback(FEEDBACK_KEY, self.detected_count());

        if !self.core.is_reporting() {
            return true;
        }
        let plot = std::mem::replace(&mut self.plot, new_plot());
        self.core.attach(plot.seal());
        if let Some(c) = &self.last_contact {
            let kind = c.kind.as_str();
            self.core.attach(PairData::new("collision type", kind));
        }
        let unanswered = self.unanswered;
        self.core
            .attach(PairData::new("collisions without braking", unanswered.to_string()));
        true
    }
}
