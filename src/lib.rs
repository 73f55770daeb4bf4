// src/lib.rs
//
// KPI grading for simulated driving scenarios: indicators evaluated every
// simulation tick, folded into a pass/fail verdict and a test report.

pub mod config;
pub mod detection;
pub mod geometry;
pub mod indicator;
pub mod indicators;
pub mod map;
pub mod messages;
pub mod pipeline;
pub mod registry;
pub mod replay;
pub mod report;
pub mod types;

pub use config::{EvalConfig, IndicatorDefinition, ThresholdLookup, ThresholdValue};
pub use indicator::{Indicator, IndicatorCore, StepOutcome, Verdict, VerdictState};
pub use indicators::default_registry;
pub use pipeline::{EvalOrchestrator, EvalOutcome};
pub use registry::{IndicatorFactory, IndicatorRegistry, RegistryError};
