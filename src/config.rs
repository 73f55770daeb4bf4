// src/config.rs
//
// Per-scenario indicator definitions and evaluation settings.
// Loaded once before Init and never mutated during a run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// ============================================================================
// THRESHOLDS
// ============================================================================

/// A threshold as configured: either numeric or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Number(f64),
    Text(String),
}

impl ThresholdValue {
    /// Numeric view; text values are parsed, booleans map to 1/0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => {
                let s = s.trim();
                match s {
                    "true" => Some(1.0),
                    "false" => Some(0.0),
                    _ => s.parse().ok(),
                }
            }
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Number(v) => v.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// 1-D score table: detected count `u` (strictly increasing) → score `y`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreMap1D {
    pub u: Vec<f64>,
    pub y: Vec<f64>,
}

impl ScoreMap1D {
    pub fn is_valid(&self) -> bool {
        self.u.len() >= 2 && self.u.len() == self.y.len() && self.u.windows(2).all(|w| w[0] < w[1])
    }

    /// Clamp outside the table, linear interpolation inside.
    pub fn lookup(&self, u: f64) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }

        let last = self.u.len() - 1;
        if u <= self.u[0] {
            return Some(self.y[0]);
        }
        if u >= self.u[last] {
            return Some(self.y[last]);
        }

        // First knot strictly above u; u lies in [u[hi-1], u[hi]).
        let hi = self.u.partition_point(|&k| k <= u);
        let lo = hi - 1;
        let (u0, u1, y0, y1) = (self.u[lo], self.u[hi], self.y[lo], self.y[hi]);
        Some((y1 - y0) * (u - u0) / (u1 - u0) + y0)
    }
}

// ============================================================================
// INDICATOR DEFINITION
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Human-readable name for the report; falls back to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdValue>,
    /// Fail when detected count >= this (values below 0.5 disable failing).
    #[serde(default)]
    pub pass_condition: f64,
    /// Request scenario stop when detected count >= this (below 0.5 disables).
    #[serde(default)]
    pub finish_condition: f64,
    #[serde(default)]
    pub score_map: Option<ScoreMap1D>,
}

impl IndicatorDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            display_name: None,
            description: String::new(),
            category: Vec::new(),
            thresholds: BTreeMap::new(),
            pass_condition: 0.0,
            finish_condition: 0.0,
            score_map: None,
        }
    }

    pub fn with_threshold(mut self, key: &str, value: ThresholdValue) -> Self {
        self.thresholds.insert(key.to_string(), value);
        self
    }

    pub fn with_pass_condition(mut self, value: f64) -> Self {
        self.pass_condition = value;
        self
    }

    pub fn with_finish_condition(mut self, value: f64) -> Self {
        self.finish_condition = value;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// `key:value;key:value` summary echoed into the report case.
    pub fn threshold_summary(&self) -> String {
        self.thresholds
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v.as_text()))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Resolved key → value lookup. Indicators never see raw config files.
pub trait ThresholdLookup {
    fn definition(&self, name: &str) -> Option<&IndicatorDefinition>;

    fn threshold_value(&self, name: &str, key: &str) -> Option<&ThresholdValue> {
        self.definition(name)?.thresholds.get(key)
    }
}

// ============================================================================
// EVALUATION CONFIG
// ============================================================================

fn default_queue_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSettings {
    #[serde(default = "default_true")]
    pub report_enabled: bool,
    #[serde(default = "default_queue_capacity")]
    pub grading_queue_capacity: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            report_enabled: true,
            grading_queue_capacity: default_queue_capacity(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub settings: EvalSettings,
    #[serde(default)]
    pub kpis: Vec<IndicatorDefinition>,
}

impl EvalConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::read(path)?.validated())
    }

    /// Parse without validation, for callers that want to install logging
    /// from `settings` before validation warnings are emitted.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = serde_yaml::from_str(contents)?;
        Ok(config.validated())
    }

    /// Drop definitions that cannot be evaluated. Never fails the run.
    pub fn validated(mut self) -> Self {
        let mut seen = HashSet::new();
        self.kpis.retain(|kpi| {
            if !seen.insert(kpi.name.clone()) {
                warn!("⚠️  Duplicate indicator definition '{}' dropped", kpi.name);
                return false;
            }
            true
        });

        for kpi in &mut self.kpis {
            if let Some(map) = &kpi.score_map {
                if !map.is_valid() {
                    warn!(
                        "⚠️  [{}] score map ignored: u must be strictly increasing with matching y",
                        kpi.name
                    );
                    kpi.score_map = None;
                }
            }
        }
        self
    }
}

impl ThresholdLookup for EvalConfig {
    fn definition(&self, name: &str) -> Option<&IndicatorDefinition> {
        self.kpis.iter().find(|k| k.name == name)
    }
}
