//! Plausibility range check on predicted values

use crate::event_log::{EventKind, EventLogger};
use crate::types::record::{FieldValue, InputRecord};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Static `(min, max)` range a project's prediction is expected to fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends; NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Classification of a prediction against its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    Warn,
}

/// Flags out-of-range predictions and records them in the audit log.
pub struct BoundsChecker<'a> {
    logger: &'a EventLogger,
}

impl<'a> BoundsChecker<'a> {
    pub fn new(logger: &'a EventLogger) -> Self {
        Self { logger }
    }

    /// Exactly one audit line is appended when the verdict is `Warn`.
    pub fn check(&self, value: f64, bounds: Bounds, record: &InputRecord) -> Verdict {
        if bounds.contains(value) {
            return Verdict::Ok;
        }

        warn!(
            value = value,
            min = bounds.min,
            max = bounds.max,
            "Prediction outside plausibility bounds"
        );
        self.logger.log(
            EventKind::Warn,
            "Prediction",
            &record.to_string(),
            &format!("Unrealistic prediction: {}", FieldValue::Float(value)),
        );
        Verdict::Warn
    }
}
