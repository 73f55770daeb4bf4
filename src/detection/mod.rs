// src/detection/mod.rs

mod edge_detector;
mod stage_gate;

pub use edge_detector::{EdgeDetector, Polarity};
pub use stage_gate::{StageGate, StageTransition};
