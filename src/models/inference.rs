//! Single-row prediction with fail-soft error handling

use crate::event_log::{EventKind, EventLogger};
use crate::feature_aligner::AlignedRow;
use crate::models::regressor::{InferenceError, Regressor};
use tracing::{debug, error};

/// Decimal digits kept on every prediction
pub const PREDICTION_DECIMALS: i32 = 4;

/// Result of one prediction attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Inference {
    /// No model or no row; inference was not attempted
    Skipped,
    /// Rounded model output
    Value(f64),
    /// The model raised; already written to the audit log
    Failed(InferenceError),
}

impl Inference {
    pub fn value(&self) -> Option<f64> {
        match self {
            Inference::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Runs models on aligned rows, logging failures to the audit log.
pub struct Predictor<'a> {
    logger: &'a EventLogger,
}

impl<'a> Predictor<'a> {
    pub fn new(logger: &'a EventLogger) -> Self {
        Self { logger }
    }

    /// Predict one row. Never propagates an error: failures are logged under
    /// the `PREDICT` field and reported as [`Inference::Failed`].
    pub fn predict<M: Regressor + ?Sized>(
        &self,
        model: Option<&M>,
        row: Option<&AlignedRow<'_>>,
    ) -> Inference {
        let (Some(model), Some(row)) = (model, row) else {
            debug!("Prediction skipped: model or row unavailable");
            return Inference::Skipped;
        };

        let result = model.predict_row(row).and_then(|raw| {
            let value = round_prediction(raw);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(InferenceError::NonFinite(raw))
            }
        });

        match result {
            Ok(value) => {
                debug!(prediction = value, "Prediction complete");
                Inference::Value(value)
            }
            Err(e) => {
                error!(error = %e, "Prediction failed");
                self.logger.log(
                    EventKind::Error,
                    "PREDICT",
                    &row.to_string(),
                    &format!("Prediction failed: {}", e),
                );
                Inference::Failed(e)
            }
        }
    }
}

/// Round to [`PREDICTION_DECIMALS`] decimal digits.
///
/// Magnitudes past `2^52 / scale` carry no digits at that precision and are
/// returned unchanged, so scaling cannot overflow to infinity.
pub fn round_prediction(value: f64) -> f64 {
    let scale = 10f64.powi(PREDICTION_DECIMALS);
    if value.abs() >= 2f64.powi(52) / scale {
        return value;
    }
    (value * scale).round() / scale
}
