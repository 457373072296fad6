//! Regression model artifacts and inference

pub mod aggregator;
pub mod inference;
pub mod loader;
pub mod regressor;

pub use inference::{Inference, Predictor};
pub use loader::{ArtifactLoadError, LoadedProject, ModelStore};
pub use regressor::{InferenceError, Model, Regressor};
