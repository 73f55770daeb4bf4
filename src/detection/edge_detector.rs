// src/detection/edge_detector.rs
//
// Turns a continuous signal + threshold into a count of NEW out-of-bound
// events. A violation that persists for many ticks counts once; it has to
// return in-bound before it can count again.
//
//   Rising:  condition = value > threshold
//   Falling: condition = value < threshold
//
// The detector starts with the condition "false", so a signal that is
// already out of bound on the very first sample counts immediately.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Polarity {
    Rising,
    Falling,
}

#[derive(Debug, Clone)]
pub struct EdgeDetector {
    polarity: Polarity,
    initial_threshold: f64,
    threshold: f64,
    count: u32,
    last_value: Option<f64>,
    active: bool,
}

impl EdgeDetector {
    /// `initial_threshold` is a sentinel that the signal cannot cross
    /// before the first real threshold arrives.
    pub fn new(polarity: Polarity, initial_threshold: f64) -> Self {
        Self {
            polarity,
            initial_threshold,
            threshold: initial_threshold,
            count: 0,
            last_value: None,
            active: false,
        }
    }

    pub fn rising() -> Self {
        Self::new(Polarity::Rising, f64::INFINITY)
    }

    pub fn falling() -> Self {
        Self::new(Polarity::Falling, f64::NEG_INFINITY)
    }

    /// Feed one sample. Returns true if this sample started a new event.
    pub fn detect(&mut self, value: f64, threshold: f64) -> bool {
        self.threshold = threshold;
        self.last_value = Some(value);

        let condition = match self.polarity {
            Polarity::Rising => value > threshold,
            Polarity::Falling => value < threshold,
        };

        let edge = condition && !self.active;
        self.active = condition;
        if edge {
            self.count += 1;
        }
        edge
    }

    /// Boolean signal. Rising counts false → true transitions, falling
    /// counts true → false.
    pub fn detect_flag(&mut self, flag: bool) -> bool {
        let value = if flag { 1.0 } else { 0.0 };
        self.detect(value, 0.5)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Currently inside a violation.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Only valid between scenarios.
    pub fn reset(&mut self) {
        self.threshold = self.initial_threshold;
        self.count = 0;
        self.last_value = None;
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rising_counts_each_new_crossing() {
        let mut det = EdgeDetector::rising();
        for v in [0.0, 2.0, 2.0, 0.0, 3.0] {
            det.detect(v, 1.0);
        }
        assert_eq!(det.count(), 2);
    }

    #[test]
    fn test_first_sample_above_threshold_counts() {
        let mut det = EdgeDetector::rising();
        assert!(det.detect(5.0, 1.0));
        assert!(!det.detect(5.0, 1.0));
        assert_eq!(det.count(), 1);
    }

    #[test]
    fn test_equal_to_threshold_is_not_a_crossing() {
        let mut det = EdgeDetector::rising();
        det.detect(1.0, 1.0);
        assert_eq!(det.count(), 0);

        let mut det = EdgeDetector::falling();
        det.detect(1.0, 1.0);
        assert_eq!(det.count(), 0);
    }

    #[test]
    fn test_falling_polarity() {
        let mut det = EdgeDetector::falling();
        for v in [3.0, 0.5, 0.2, 2.0, 0.1, 0.1] {
            det.detect(v, 1.0);
        }
        assert_eq!(det.count(), 2);
        assert_eq!(det.last_value(), Some(0.1));
    }

    #[test]
    fn test_flag_detection() {
        let mut det = EdgeDetector::rising();
        for f in [false, true, true, false, true] {
            det.detect_flag(f);
        }
        assert_eq!(det.count(), 2);
    }

    #[test]
    fn test_falling_flag_counts_drops() {
        let mut det = EdgeDetector::falling();
        let edges: Vec<bool> = [true, false, false, true, false]
            .into_iter()
            .map(|f| det.detect_flag(f))
            .collect();
        assert_eq!(edges, vec![false, true, false, false, true]);
        assert_eq!(det.count(), 2);
    }

    #[test]
    fn test_sentinel_never_crossed_and_reset() {
        let mut det = EdgeDetector::rising();
        assert_eq!(det.threshold(), f64::INFINITY);
        det.detect(10.0, 1.0);
        assert_eq!(det.count(), 1);

        det.reset();
        assert_eq!(det.count(), 0);
        assert_eq!(det.threshold(), f64::INFINITY);
        assert!(det.last_value().is_none());
    }

    proptest! {
        #[test]
        fn prop_count_monotonic_and_steps_by_at_most_one(
            samples in proptest::collection::vec(-10.0f64..10.0, 0..200),
            threshold in -5.0f64..5.0,
            rising in any::<bool>(),
        ) {
            let mut det = if rising { EdgeDetector::rising() } else { EdgeDetector::falling() };
            let mut prev = det.count();
            for v in samples {
                let edge = det.detect(v, threshold);
                let now = det.count();
                prop_assert!(now >= prev);
                prop_assert!(now - prev <= 1);
                prop_assert_eq!(edge, now == prev + 1);
                prev = now;
            }
        }
    }
}
