// src/report/mod.rs

mod case;
mod fragment;

pub use case::{CaseInfo, CaseResult, ReportCase, TestReport};
pub use fragment::{
    Axis, Bound, IntervalType, PairData, ReportError, ReportFragment, ThresholdLine, XYPlot,
};
