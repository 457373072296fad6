//! Combining member outputs of ensemble models

use serde::{Deserialize, Serialize};

/// How a tree ensemble folds its leaf values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Gradient boosting: leaves are additive corrections
    #[default]
    Sum,
    /// Random forest: every tree is a full estimate
    Mean,
}

impl Aggregation {
    pub fn combine(&self, outputs: &[f64]) -> f64 {
        let total: f64 = outputs.iter().sum();
        match self {
            Aggregation::Sum => total,
            Aggregation::Mean if outputs.is_empty() => 0.0,
            Aggregation::Mean => total / outputs.len() as f64,
        }
    }
}

/// Weighted average of member predictions, weights normalised to sum to 1.
///
/// Returns `None` when there is nothing to average or the weights cancel out.
pub fn weighted_mean(members: &[(f64, f64)]) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for &(weight, prediction) in members {
        weighted_sum += prediction * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        None
    }
}
