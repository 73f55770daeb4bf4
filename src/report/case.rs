// src/report/case.rs
//
// One case per indicator per scenario, collected into the run's TestReport.

use super::fragment::ReportFragment;
use crate::config::IndicatorDefinition;
use crate::indicator::VerdictState;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub state: VerdictState,
    pub reason: String,
    pub score: Option<f64>,
}

/// Configuration echo plus the fields the indicator sets while running.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CaseInfo {
    pub indicator: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub threshold_info: String,
    pub pass_condition: f64,
    pub finish_condition: f64,
    pub detected_count: u32,
    pub request_stop: bool,
    pub result: Option<CaseResult>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReportCase {
    pub info: CaseInfo,
    fragments: Vec<ReportFragment>,
}

impl ReportCase {
    pub fn new(indicator: &str) -> Self {
        Self {
            info: CaseInfo {
                indicator: indicator.to_string(),
                name: indicator.to_string(),
                ..CaseInfo::default()
            },
            fragments: Vec::new(),
        }
    }

    pub fn from_definition(def: &IndicatorDefinition) -> Self {
        let mut case = Self::new(&def.name);
        case.info.name = def.display_name().to_string();
        case.info.description = def.description.clone();
        case.info.category = def.category.join(";");
        case.info.threshold_info = def.threshold_summary();
        case.info.pass_condition = def.pass_condition;
        case.info.finish_condition = def.finish_condition;
        case
    }

    /// Append-only: attached fragments are never touched again.
    pub fn attach(&mut self, fragment: impl Into<ReportFragment>) {
        self.fragments.push(fragment.into());
    }

    pub fn fragments(&self) -> &[ReportFragment] {
        &self.fragments
    }

    pub fn set_result(&mut self, state: VerdictState, reason: &str, score: Option<f64>) {
        self.info.result = Some(CaseResult {
            state,
            reason: reason.to_string(),
            score,
        });
    }
}

/// Structured output of one scenario run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TestReport {
    pub scenario_name: String,
    pub passed: bool,
    pub reason: String,
    pub total_sim_time_s: f64,
    pub early_stop: Option<String>,
    pub cases: Vec<ReportCase>,
    pub feedback: BTreeMap<String, String>,
}

impl TestReport {
    pub fn new(scenario_name: &str) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            passed: true,
            ..Self::default()
        }
    }

    pub fn add_case(&mut self, case: ReportCase) {
        self.cases.push(case);
    }

    pub fn case(&self, indicator: &str) -> Option<&ReportCase> {
        self.cases.iter().find(|c| c.info.indicator == indicator)
    }
}
