//! Outcome of one prediction cycle

use crate::bounds::{Bounds, Verdict};
use crate::feature_aligner::UnseenCategory;
use crate::types::record::InputRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a prediction cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    /// Prediction within bounds
    Success,
    /// Prediction made but outside the project's bounds
    Unrealistic,
    /// The model raised during inference
    PredictionFailed,
    /// Model or feature artifact could not be loaded
    LoadFailed,
    /// A submitted value did not fit its widget
    InvalidInput,
}

impl PredictionStatus {
    /// Display severity: success, warning or error styling
    pub fn severity(&self) -> &'static str {
        match self {
            PredictionStatus::Success => "success",
            PredictionStatus::Unrealistic | PredictionStatus::PredictionFailed => "warning",
            PredictionStatus::LoadFailed | PredictionStatus::InvalidInput => "error",
        }
    }
}

/// Everything the presentation layer needs to render a cycle's result
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub report_id: String,
    pub project: String,
    pub record: InputRecord,
    pub status: PredictionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unseen_categories: Vec<UnseenCategory>,
    pub timestamp: DateTime<Utc>,
}

impl PredictionReport {
    fn new(project: &str, record: InputRecord, status: PredictionStatus, message: String) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            project: project.to_string(),
            record,
            status,
            prediction: None,
            verdict: None,
            bounds: None,
            message,
            unseen_categories: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn predicted(project: &str, record: InputRecord, value: f64, bounds: Bounds, verdict: Verdict) -> Self {
        let (status, message) = match verdict {
            Verdict::Ok => (PredictionStatus::Success, format!("Predicted value: {:?}", value)),
            Verdict::Warn => (
                PredictionStatus::Unrealistic,
                format!("Prediction seems unrealistic: {:?}", value),
            ),
        };

        Self {
            prediction: Some(value),
            verdict: Some(verdict),
            bounds: Some(bounds),
            ..Self::new(project, record, status, message)
        }
    }

    pub fn prediction_failed(project: &str, record: InputRecord) -> Self {
        Self::new(
            project,
            record,
            PredictionStatus::PredictionFailed,
            "Prediction failed. Check inputs.".to_string(),
        )
    }

    pub fn load_failed(project: &str, record: InputRecord, error: impl std::fmt::Display) -> Self {
        Self::new(
            project,
            record,
            PredictionStatus::LoadFailed,
            format!("Error loading model/features: {}", error),
        )
    }

    pub fn invalid_input(project: &str, record: InputRecord, field: &str, error: impl std::fmt::Display) -> Self {
        Self::new(
            project,
            record,
            PredictionStatus::InvalidInput,
            format!("Invalid value for {}: {}", field, error),
        )
    }

    /// Attach categories that had no training column
    pub fn with_unseen_categories(mut self, unseen: Vec<UnseenCategory>) -> Self {
        self.unseen_categories = unseen;
        self
    }

    /// Non-blocking notices about the input, one per unseen category
    pub fn notices(&self) -> Vec<String> {
        self.unseen_categories
            .iter()
            .map(|u| {
                format!(
                    "{} '{}' was not seen during training and is treated as unknown",
                    u.field, u.value
                )
            })
            .collect()
    }
}
