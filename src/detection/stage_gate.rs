// src/detection/stage_gate.rs
//
// Tracks whether the scenario is in the stage an indicator cares about.
// The transition out of the stage is reported once so the caller can clear
// its stage-scoped accumulators.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTransition {
    /// Just entered the target stage this tick
    Entered,
    /// Still in the target stage
    Active,
    /// Just left the target stage this tick
    Left,
    /// Outside the target stage
    Inactive,
}

impl StageTransition {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Entered | Self::Active)
    }
}

#[derive(Debug, Clone)]
pub struct StageGate<S> {
    target: S,
    inside: bool,
}

impl<S: PartialEq + std::fmt::Debug> StageGate<S> {
    pub fn new(target: S) -> Self {
        Self {
            target,
            inside: false,
        }
    }

    pub fn observe(&mut self, stage: &S) -> StageTransition {
        let now_inside = *stage == self.target;
        let transition = match (self.inside, now_inside) {
            (false, true) => StageTransition::Entered,
            (true, true) => StageTransition::Active,
            (true, false) => StageTransition::Left,
            (false, false) => StageTransition::Inactive,
        };
        if matches!(transition, StageTransition::Entered | StageTransition::Left) {
            debug!("Stage {:?}: {:?} (now {:?})", self.target, transition, stage);
        }
        self.inside = now_inside;
        transition
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    pub fn reset(&mut self) {
        self.inside = false;
    }
}
