//! Vibration threshold alarm.
//!
//! The alarm is a plain inclusive comparison against the threshold with no
//! hysteresis band. A reading hovering at the threshold toggles the alarm on
//! every crossing; publication is edge-triggered through
//! [`AlarmTransition::changed`].

/// Vibration level (mm/s) at which the bearing alarm becomes active.
pub const ALARM_THRESHOLD_MM_S: f64 = 7.0;

/// Outcome of one alarm evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTransition {
    pub active: bool,
    pub changed: bool,
}

/// Pure threshold evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmEvaluator {
    threshold: f64,
}

impl Default for AlarmEvaluator {
    fn default() -> Self {
        Self::new(ALARM_THRESHOLD_MM_S)
    }
}

impl AlarmEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `active` is `vibration >= threshold`; `changed` reports whether that
    /// differs from `previous`.
    pub fn evaluate(&self, vibration: f64, previous: bool) -> AlarmTransition {
        let active = vibration >= self.threshold;
        AlarmTransition {
            active,
            changed: active != previous,
        }
    }
}
