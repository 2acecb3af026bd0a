//! Threshold filtering of prediction results.
//!
//! Scoring belongs to the prediction service. This module only hides
//! suggestions below the user's confidence threshold and sizes the threshold
//! control from the service's hint.

use crate::types::{PredictionResult, Suggestion, ThresholdHint};

/// Slack applied before rounding a hint up to whole percent, so that
/// `0.07 * 200 = 14.000000000000002` still lands on 14 %.
const PERCENT_ROUNDING_SLACK: f64 = 1e-9;

/// Returns the suggestions with `probability >= threshold`, in service order.
///
/// The result is monotonic: a higher threshold never yields a suggestion that a
/// lower one hides.
pub fn filter(result: &PredictionResult, threshold: f64) -> Vec<Suggestion> {
    result
        .suggestions
        .iter()
        .filter(|s| s.probability >= threshold)
        .cloned()
        .collect()
}

/// Current threshold and the upper end of the threshold control.
///
/// Invariant: `0 <= value <= max <= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBounds {
    pub value: f64,
    pub max: f64,
}

impl Default for ThresholdBounds {
    fn default() -> Self {
        Self { value: 0.0, max: 1.0 }
    }
}

impl ThresholdBounds {
    /// Builds bounds from persisted values, restoring the invariant if the
    /// stored pair violates it.
    pub fn new(value: f64, max: f64) -> Self {
        let max = sanitize(max, 1.0).clamp(0.0, 1.0);
        Self { value: sanitize(value, 0.0).clamp(0.0, max), max }
    }

    /// Upper bound implied by a hint: twice the hint, whole percent, capped at 100 %.
    pub fn max_for_hint(hint: ThresholdHint) -> f64 {
        let percent = (hint.value * 200.0 - PERCENT_ROUNDING_SLACK).ceil();
        (percent / 100.0).clamp(0.0, 1.0)
    }

    /// Applies a service hint.
    ///
    /// `max` is always resized. When `user_set` is false the threshold falls back
    /// to half of the new `max`; otherwise the user's value is kept, clamped.
    pub fn apply_hint(&mut self, hint: ThresholdHint, user_set: bool) {
        self.max = Self::max_for_hint(hint);
        self.value = if user_set { self.value.min(self.max) } else { self.max / 2.0 };
    }

    /// Sets the threshold, clamped into `[0, max]`. Returns the stored value.
    pub fn set(&mut self, value: f64) -> f64 {
        self.value = sanitize(value, self.value).clamp(0.0, self.max);
        self.value
    }

    /// Moves the threshold by whole percentage points, snapping to the percent grid.
    pub fn step(&mut self, percent_delta: i32) -> f64 {
        let current = (self.value * 100.0).round();
        self.set((current + f64::from(percent_delta)) / 100.0)
    }

    /// The threshold as a whole percentage, for display.
    pub fn value_percent(&self) -> u32 {
        (self.value * 100.0).round() as u32
    }

    pub fn max_percent(&self) -> u32 {
        (self.max * 100.0).round() as u32
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(id: &str, probability: f64) -> Suggestion {
        Suggestion {
            repository: "x/y".into(),
            id: id.into(),
            title: format!("title {id}"),
            probability,
        }
    }

    fn sample() -> PredictionResult {
        PredictionResult {
            suggestions: vec![
                suggestion("1", 0.9),
                suggestion("2", 0.3),
                suggestion("3", 0.55),
                suggestion("4", 0.05),
            ],
            error: None,
        }
    }

    #[test]
    fn keeps_service_order() {
        let ids: Vec<_> = filter(&sample(), 0.25).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(filter(&sample(), 0.3).len(), 3);
        assert_eq!(filter(&sample(), 0.3000001).len(), 2);
    }

    #[test]
    fn filtering_is_monotonic() {
        let result = sample();
        let steps: Vec<f64> = (0..=100).map(|p| f64::from(p) / 100.0).collect();
        for (i, &low) in steps.iter().enumerate() {
            let loose = filter(&result, low);
            for &high in &steps[i..] {
                for kept in filter(&result, high) {
                    assert!(loose.contains(&kept), "{} visible at {high} but not at {low}", kept.id);
                }
            }
        }
    }

    #[test]
    fn hint_doubles_to_whole_percent() {
        let mut bounds = ThresholdBounds::default();
        bounds.apply_hint(ThresholdHint { value: 0.10 }, false);
        assert!((bounds.max - 0.20).abs() < 1e-12);
        assert!((bounds.value - 0.10).abs() < 1e-12);

        assert_eq!(ThresholdBounds::max_for_hint(ThresholdHint { value: 0.07 }), 0.14);
        assert_eq!(ThresholdBounds::max_for_hint(ThresholdHint { value: 0.123 }), 0.25);
        assert_eq!(ThresholdBounds::max_for_hint(ThresholdHint { value: 0.8 }), 1.0);
    }

    #[test]
    fn hint_keeps_user_threshold_within_max() {
        let mut bounds = ThresholdBounds::new(0.15, 1.0);
        bounds.apply_hint(ThresholdHint { value: 0.10 }, true);
        assert!((bounds.value - 0.15).abs() < 1e-12);

        let mut bounds = ThresholdBounds::new(0.5, 1.0);
        bounds.apply_hint(ThresholdHint { value: 0.10 }, true);
        assert!(bounds.value <= bounds.max);
    }

    #[test]
    fn set_and_step_clamp_to_range() {
        let mut bounds = ThresholdBounds::new(0.1, 0.2);
        assert_eq!(bounds.set(0.5), 0.2);
        assert_eq!(bounds.set(-1.0), 0.0);
        assert_eq!(bounds.set(f64::NAN), 0.0);
        bounds.set(0.1);
        assert_eq!(bounds.step(5), 0.15);
        assert_eq!(bounds.value_percent(), 15);
        assert_eq!(bounds.step(-50), 0.0);
    }

    #[test]
    fn new_restores_invariant() {
        let bounds = ThresholdBounds::new(0.9, 0.4);
        assert_eq!(bounds, ThresholdBounds { value: 0.4, max: 0.4 });
        let bounds = ThresholdBounds::new(0.1, 7.0);
        assert_eq!(bounds.max, 1.0);
    }
}
