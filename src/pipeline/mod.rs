// src/pipeline/mod.rs

pub mod context;
pub mod grading;
pub mod metrics;
pub mod orchestrator;

pub use context::{InitContext, StepContext, StopContext};
pub use grading::{DetectedEvent, GradingSummary};
pub use metrics::{EvalMetrics, MetricsSummary};
pub use orchestrator::{
    EvalError, EvalOrchestrator, EvalOutcome, EvalPhase, IndicatorVerdict, TickReport,
};
