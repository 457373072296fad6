//! Multi_Predicto Library
//!
//! Serves regression models for several independent projects behind one
//! form: align a single input row to the project's training schema, predict,
//! flag values outside the project's plausible range, and keep an
//! append-only log of everything that went wrong.

pub mod bounds;
pub mod config;
pub mod event_log;
pub mod feature_aligner;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod types;
pub mod web;

pub use bounds::{Bounds, BoundsChecker, Verdict};
pub use config::AppConfig;
pub use event_log::{EventKind, EventLogger, LogReceipt};
pub use feature_aligner::{align, AlignedRow, FeatureSchema};
pub use metrics::PredictionMetrics;
pub use models::{Inference, ModelStore, Predictor};
pub use pipeline::PredictionPipeline;
pub use types::{record::InputRecord, report::PredictionReport};
