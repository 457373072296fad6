//! One prediction cycle, from raw form values to a renderable report.
//!
//! Every user action runs the whole cycle synchronously: resolve the
//! project, coerce the inputs, load the artifacts (no caching between
//! cycles), align, predict, check bounds. Each failure is handled where it
//! happens and turned into a report; nothing here returns an error.

use crate::bounds::BoundsChecker;
use crate::config::{AppConfig, ProjectConfig};
use crate::event_log::{EventKind, EventLogger};
use crate::feature_aligner::align;
use crate::metrics::PredictionMetrics;
use crate::models::loader::{load_project, ArtifactLoadError, ModelStore};
use crate::models::{Inference, Predictor};
use crate::types::field::InputError;
use crate::types::record::{FieldValue, InputRecord};
use crate::types::report::PredictionReport;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn};

/// Raw submitted values keyed by field name
pub type RawInputs = BTreeMap<String, FieldValue>;

/// Runs prediction cycles against a fixed set of projects
pub struct PredictionPipeline {
    store: ModelStore,
    logger: EventLogger,
    metrics: Arc<PredictionMetrics>,
}

impl PredictionPipeline {
    pub fn new(store: ModelStore, logger: EventLogger, metrics: Arc<PredictionMetrics>) -> Self {
        Self {
            store,
            logger,
            metrics,
        }
    }

    pub fn from_config(config: &AppConfig, metrics: Arc<PredictionMetrics>) -> Self {
        Self::new(
            ModelStore::new(config.projects.clone()),
            EventLogger::new(&config.audit_log.path),
            metrics,
        )
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn logger(&self) -> &EventLogger {
        &self.logger
    }

    pub fn metrics(&self) -> &Arc<PredictionMetrics> {
        &self.metrics
    }

    /// Load a project's artifacts without predicting, to surface load
    /// errors as soon as the project is selected.
    pub fn probe(&self, project: &str) -> Result<(), ArtifactLoadError> {
        self.store.load(project).map(|_| ())
    }

    /// Run one full prediction cycle
    pub fn run(&self, project: &str, raw: &RawInputs) -> PredictionReport {
        let started = Instant::now();
        let report = {
            let span = info_span!("prediction", project = %project);
            let _guard = span.enter();
            self.run_cycle(project, raw)
        };

        self.metrics
            .record_cycle(&report.project, report.status, started.elapsed());
        info!(
            project = %report.project,
            status = ?report.status,
            prediction = ?report.prediction,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Prediction cycle finished"
        );
        report
    }

    fn run_cycle(&self, name: &str, raw: &RawInputs) -> PredictionReport {
        let Some(project) = self.store.project(name) else {
            let error = ArtifactLoadError::UnknownProject(name.to_string());
            return PredictionReport::load_failed(name, raw_record(raw), error);
        };

        let record = match build_record(project, raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(field = e.field(), error = %e, "Invalid input");
                self.logger.log(
                    EventKind::Error,
                    e.field(),
                    &e.raw_value(),
                    &format!("Invalid input: {}", e),
                );
                return PredictionReport::invalid_input(name, raw_record(raw), e.field(), &e);
            }
        };

        let loaded = match load_project(project) {
            Ok(loaded) => loaded,
            Err(e) => return PredictionReport::load_failed(name, record, e),
        };

        let row = align(&record, Some(&loaded.schema));
        let unseen = row
            .as_ref()
            .map(|r| r.unseen_categories().to_vec())
            .unwrap_or_default();
        for category in &unseen {
            info!(field = %category.field, value = %category.value, "Category not seen during training");
        }

        let report = match Predictor::new(&self.logger).predict(Some(&loaded.model), row.as_ref()) {
            Inference::Value(value) => {
                let verdict = BoundsChecker::new(&self.logger).check(value, project.bounds, &record);
                PredictionReport::predicted(name, record, value, project.bounds, verdict)
            }
            Inference::Failed(_) | Inference::Skipped => PredictionReport::prediction_failed(name, record),
        };

        report.with_unseen_categories(unseen)
    }
}

/// Coerce raw values through the project's widgets.
///
/// Fields the project describes come first, in widget order, with defaults
/// for anything missing. Values for undescribed fields are passed through
/// unchanged so API callers can submit records directly.
pub fn build_record(project: &ProjectConfig, raw: &RawInputs) -> Result<InputRecord, InputError> {
    let mut record = InputRecord::new();

    for field in &project.inputs {
        record.insert(field.name.clone(), field.coerce(raw.get(&field.name))?);
    }

    for (name, value) in raw {
        if record.get(name).is_none() {
            record.insert(name.clone(), value.clone());
        }
    }

    Ok(record)
}

fn raw_record(raw: &RawInputs) -> InputRecord {
    raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{Bounds, Verdict};
    use crate::config::default_projects;
    use crate::types::report::PredictionStatus;
    use std::fs;
    use std::path::Path;

    const LAPTOP_FEATURES: &str = r#"[
        "Ram", "SSD", "HDD", "Weight", "Inches",
        "Company_Dell", "Company_HP", "Company_Lenovo",
        "TypeName_Gaming", "TypeName_Notebook", "TypeName_Ultrabook",
        "Touch_No", "Touch_Yes"
    ]"#;

    struct Fixture {
        dir: tempfile::TempDir,
        pipeline: PredictionPipeline,
    }

    impl Fixture {
        /// Default laptop project with artifacts placed in a temp dir
        fn laptop(model_json: Option<&str>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut project = default_projects().remove(0);
            project.model_path = dir.path().join("laptop_best_model.json");
            project.features_path = dir.path().join("laptop_features.json");

            fs::write(&project.features_path, LAPTOP_FEATURES).unwrap();
            if let Some(json) = model_json {
                fs::write(&project.model_path, json).unwrap();
            }

            let pipeline = PredictionPipeline::new(
                ModelStore::new(vec![project]),
                EventLogger::new(dir.path().join("logs").join("input_errors.log")),
                Arc::new(PredictionMetrics::new()),
            );
            Self { dir, pipeline }
        }

        fn log_lines(&self) -> Vec<String> {
            read_lines(&self.dir.path().join("logs").join("input_errors.log"))
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn laptop_inputs() -> RawInputs {
        [
            ("Company", FieldValue::from("Dell")),
            ("TypeName", FieldValue::from("Notebook")),
            ("Ram", FieldValue::from(8)),
            ("SSD", FieldValue::from(512)),
            ("HDD", FieldValue::from(0)),
            ("Weight", FieldValue::from(1.5)),
            ("Inches", FieldValue::from(13.3)),
            ("Touch", FieldValue::from("No")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_unrealistic_laptop_prediction() {
        // 3000 + 8 GB * 500 = 7000, above the 6920 ceiling
        let fixture = Fixture::laptop(Some(
            r#"{"kind": "linear", "intercept": 3000.0, "coefficients": {"Ram": 500.0, "Company_HP": 900.0}}"#,
        ));

        let report = fixture.pipeline.run("Laptop Prices", &laptop_inputs());

        assert_eq!(report.status, PredictionStatus::Unrealistic);
        assert_eq!(report.prediction, Some(7000.0));
        assert_eq!(report.verdict, Some(Verdict::Warn));
        assert_eq!(report.bounds, Some(Bounds::new(100.0, 6920.0)));

        let lines = fixture.log_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("WARN | Field: Prediction"));
        assert!(lines[0].contains("'Company': 'Dell'"));
        assert!(lines[0].contains("Unrealistic prediction: 7000.0"));
    }

    #[test]
    fn test_realistic_prediction_writes_nothing() {
        let fixture = Fixture::laptop(Some(
            r#"{"kind": "linear", "intercept": 200.0, "coefficients": {"Ram": 50.0, "SSD": 0.5, "Company_Dell": 100.0}}"#,
        ));

        let report = fixture.pipeline.run("Laptop Prices", &laptop_inputs());

        assert_eq!(report.status, PredictionStatus::Success);
        assert_eq!(report.prediction, Some(956.0));
        assert_eq!(report.message, "Predicted value: 956.0");
        assert!(fixture.log_lines().is_empty());
        assert_eq!(fixture.pipeline.metrics().snapshot().successes, 1);
    }

    #[test]
    fn test_missing_model_file_stops_the_cycle() {
        let fixture = Fixture::laptop(None);

        let report = fixture.pipeline.run("Laptop Prices", &laptop_inputs());

        assert_eq!(report.status, PredictionStatus::LoadFailed);
        assert_eq!(report.prediction, None);
        assert!(report.message.starts_with("Error loading model/features"));
        assert!(fixture.log_lines().iter().all(|l| !l.contains("PREDICT")));
        assert!(fixture.pipeline.probe("Laptop Prices").is_err());
    }

    #[test]
    fn test_inference_failure_is_logged_and_soft() {
        let fixture = Fixture::laptop(Some(
            r#"{"kind": "linear", "intercept": 0.0, "coefficients": {"Cpu_GHz": 10.0}}"#,
        ));

        let report = fixture.pipeline.run("Laptop Prices", &laptop_inputs());

        assert_eq!(report.status, PredictionStatus::PredictionFailed);
        assert_eq!(report.message, "Prediction failed. Check inputs.");
        let lines = fixture.log_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR | Field: PREDICT"));
    }

    #[test]
    fn test_invalid_input_is_rejected_before_loading() {
        let fixture = Fixture::laptop(None);
        let mut inputs = laptop_inputs();
        inputs.insert("Ram".to_string(), FieldValue::from("eight"));

        let report = fixture.pipeline.run("Laptop Prices", &inputs);

        assert_eq!(report.status, PredictionStatus::InvalidInput);
        assert_eq!(report.message, "Invalid value for Ram: 'eight' is not a number");
        let lines = fixture.log_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR | Field: Ram | Value: 'eight'"));
    }

    #[test]
    fn test_unseen_category_is_reported() {
        let fixture = Fixture::laptop(Some(
            r#"{"kind": "linear", "intercept": 1000.0, "coefficients": {"Company_Dell": 100.0}}"#,
        ));
        let mut inputs = laptop_inputs();
        inputs.insert("Company".to_string(), FieldValue::from("Apple"));

        let report = fixture.pipeline.run("Laptop Prices", &inputs);

        assert_eq!(report.status, PredictionStatus::Success);
        assert_eq!(report.prediction, Some(1000.0));
        assert_eq!(report.unseen_categories.len(), 1);
        assert_eq!(report.unseen_categories[0].value, "Apple");
    }

    #[test]
    fn test_unknown_project() {
        let fixture = Fixture::laptop(None);

        let report = fixture.pipeline.run("Weather", &RawInputs::new());

        assert_eq!(report.status, PredictionStatus::LoadFailed);
        assert_eq!(report.message, "Error loading model/features: unknown project 'Weather'");
    }

    #[test]
    fn test_build_record_orders_and_defaults() {
        let project = default_projects().remove(0);
        let mut raw = RawInputs::new();
        raw.insert("Ram".to_string(), FieldValue::from("16"));
        raw.insert("Gpu".to_string(), FieldValue::from("Nvidia"));

        let record = build_record(&project, &raw).unwrap();

        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["Company", "TypeName", "Ram", "SSD", "HDD", "Weight", "Inches", "Touch", "Gpu"]
        );
        assert_eq!(record.get("Ram"), Some(&FieldValue::Integer(16)));
        assert_eq!(record.get("Company"), Some(&FieldValue::from("Dell")));
        assert_eq!(record.get("Weight"), Some(&FieldValue::Float(1.5)));
    }
}
