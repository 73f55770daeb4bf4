// src/report/fragment.rs
//
// Human-readable evidence an indicator collects while stepping.
//
// A plot is mutable while the scenario runs (append-only, O(1) per tick)
// and is consumed by `seal()` at Stop. Once sealed it lives inside a
// `ReportFragment` and can no longer be changed.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("plot '{plot}' expects {expected} series values, got {got}")]
    SeriesLength {
        plot: String,
        expected: usize,
        got: usize,
    },
    #[error("plot '{plot}' has no y axis {index}")]
    AxisIndex { plot: String, index: usize },
}

// ============================================================================
// PAIR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairData {
    pub label: String,
    pub value: String,
}

impl PairData {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Numeric value rendered with a unit suffix, e.g. `0.412m`.
    pub fn metric(label: impl Into<String>, value: f64, unit: &str) -> Self {
        Self::new(label, format!("{:.3}{}", value, unit))
    }
}

// ============================================================================
// THRESHOLD LINES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bound {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntervalType {
    Open,
    Closed,
}

/// Constant reference line drawn over a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdLine {
    pub description: String,
    pub value: f64,
    pub bound: Bound,
    pub interval: IntervalType,
}

impl ThresholdLine {
    pub fn upper(description: impl Into<String>, value: f64) -> Self {
        Self {
            description: description.into(),
            value,
            bound: Bound::Upper,
            interval: IntervalType::Open,
        }
    }

    pub fn lower(description: impl Into<String>, value: f64) -> Self {
        Self {
            description: description.into(),
            value,
            bound: Bound::Lower,
            interval: IntervalType::Open,
        }
    }

    pub fn closed(mut self) -> Self {
        self.interval = IntervalType::Closed;
        self
    }

    /// +1 for upper bounds, -1 for lower bounds.
    pub fn sign(&self) -> i8 {
        match self.bound {
            Bound::Upper => 1,
            Bound::Lower => -1,
        }
    }
}

// ============================================================================
// AXIS / PLOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub name: String,
    pub unit: String,
    pub data: Vec<f64>,
    pub threshold_upper: Option<ThresholdLine>,
    pub threshold_lower: Option<ThresholdLine>,
}

impl Axis {
    fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            data: Vec::new(),
            threshold_upper: None,
            threshold_lower: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Population variance.
    pub fn variance(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.data.len() as f64
    }

    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }
}

/// Multi-series time plot: x = simulation time, N y-series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XYPlot {
    pub name: String,
    pub description: String,
    pub x_axis: Axis,
    pub y_axes: Vec<Axis>,
}

impl XYPlot {
    /// `y_names` and `y_units` are zipped; extra entries in the longer one
    /// are ignored.
    pub fn new(name: &str, x_name: &str, x_unit: &str, y_names: &[&str], y_units: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            x_axis: Axis::new(x_name, x_unit),
            y_axes: y_names
                .iter()
                .zip(y_units)
                .map(|(n, u)| Axis::new(n, u))
                .collect(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn set_threshold(&mut self, y_index: usize, line: ThresholdLine) -> Result<(), ReportError> {
        let axis = self
            .y_axes
            .get_mut(y_index)
            .ok_or_else(|| ReportError::AxisIndex {
                plot: self.name.clone(),
                index: y_index,
            })?;
        match line.bound {
            Bound::Upper => axis.threshold_upper = Some(line),
            Bound::Lower => axis.threshold_lower = Some(line),
        }
        Ok(())
    }

    /// One sample per tick. Rejects the whole sample if the series count
    /// does not match, so the axes always stay the same length.
    pub fn append_sample(&mut self, t: f64, values: &[f64]) -> Result<(), ReportError> {
        if values.len() != self.y_axes.len() {
            return Err(ReportError::SeriesLength {
                plot: self.name.clone(),
                expected: self.y_axes.len(),
                got: values.len(),
            });
        }
        self.x_axis.data.push(t);
        for (axis, v) in self.y_axes.iter_mut().zip(values) {
            axis.data.push(*v);
        }
        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        self.x_axis.len()
    }

    pub fn series(&self, index: usize) -> Option<&Axis> {
        self.y_axes.get(index)
    }

    /// Drop all samples, keep axes and thresholds. Used on scenario reset.
    pub fn clear_samples(&mut self) {
        self.x_axis.data.clear();
        for axis in &mut self.y_axes {
            axis.data.clear();
        }
    }

    pub fn seal(self) -> ReportFragment {
        ReportFragment::Plot(self)
    }
}

// ============================================================================
// FRAGMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportFragment {
    Pair(PairData),
    Plot(XYPlot),
}

impl From<PairData> for ReportFragment {
    fn from(pair: PairData) -> Self {
        ReportFragment::Pair(pair)
    }
}
