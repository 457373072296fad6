//! Model store: per-project model and feature-schema artifacts on disk

use crate::config::ProjectConfig;
use crate::feature_aligner::{FeatureSchema, SchemaError};
use crate::models::regressor::Model;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Which of the two artifacts a failure concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Features,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Features => "features",
        })
    }
}

#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("unknown project '{0}'")]
    UnknownProject(String),

    #[error("cannot read {kind} file {}: {source}", .path.display())]
    Read {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode {kind} file {}: {source}", .path.display())]
    Decode {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid feature schema {}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

/// Model and schema of one project, loaded together
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub model: Model,
    pub schema: FeatureSchema,
}

/// Read-only view over the configured project artifacts.
#[derive(Debug, Clone)]
pub struct ModelStore {
    projects: Vec<ProjectConfig>,
}

impl ModelStore {
    pub fn new(projects: Vec<ProjectConfig>) -> Self {
        Self { projects }
    }

    pub fn projects(&self) -> &[ProjectConfig] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Load a project's artifacts by name.
    pub fn load(&self, name: &str) -> Result<LoadedProject, ArtifactLoadError> {
        let project = self
            .project(name)
            .ok_or_else(|| ArtifactLoadError::UnknownProject(name.to_string()))?;
        load_project(project)
    }
}

/// Deserialize both artifacts of a project. Nothing is cached.
pub fn load_project(project: &ProjectConfig) -> Result<LoadedProject, ArtifactLoadError> {
    let result = load_model(&project.model_path).and_then(|model| {
        let schema = load_schema(&project.features_path)?;
        Ok(LoadedProject { model, schema })
    });

    match &result {
        Ok(loaded) => info!(
            project = %project.name,
            model = loaded.model.kind(),
            features = loaded.schema.len(),
            "Artifacts loaded"
        ),
        Err(e) => warn!(project = %project.name, error = %e, "Error loading model/features"),
    }

    result
}

pub fn load_model(path: &Path) -> Result<Model, ArtifactLoadError> {
    let bytes = read(ArtifactKind::Model, path)?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactLoadError::Decode {
        kind: ArtifactKind::Model,
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_schema(path: &Path) -> Result<FeatureSchema, ArtifactLoadError> {
    let bytes = read(ArtifactKind::Features, path)?;
    let columns: Vec<String> =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactLoadError::Decode {
            kind: ArtifactKind::Features,
            path: path.to_path_buf(),
            source,
        })?;

    FeatureSchema::new(columns).map_err(|source| ArtifactLoadError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

fn read(kind: ArtifactKind, path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    fs::read(path).map_err(|source| ArtifactLoadError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;

    fn project_in(dir: &Path) -> ProjectConfig {
        ProjectConfig {
            name: "Laptop Prices".to_string(),
            model_path: dir.join("laptop_model.json"),
            features_path: dir.join("laptop_features.json"),
            bounds: Bounds::new(100.0, 6920.0),
            inputs: Vec::new(),
        }
    }

    #[test]
    fn test_load_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path());
        fs::write(
            &project.model_path,
            r#"{"kind": "linear", "intercept": 300.0, "coefficients": {"Ram": 40.0}}"#,
        )
        .unwrap();
        fs::write(&project.features_path, r#"["Ram", "Company_Dell"]"#).unwrap();

        let store = ModelStore::new(vec![project]);
        let loaded = store.load("Laptop Prices").unwrap();

        assert_eq!(loaded.model.kind(), "linear");
        assert_eq!(loaded.schema.columns(), &["Ram", "Company_Dell"]);
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path());
        fs::write(&project.features_path, r#"["Ram"]"#).unwrap();

        let err = load_project(&project).unwrap_err();
        assert!(matches!(
            err,
            ArtifactLoadError::Read {
                kind: ArtifactKind::Model,
                ..
            }
        ));
        assert!(err.to_string().starts_with("cannot read model file"));
    }

    #[test]
    fn test_corrupt_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path());
        fs::write(&project.model_path, b"\x80\x04\x95 pickled bytes").unwrap();
        fs::write(&project.features_path, r#"["Ram"]"#).unwrap();

        assert!(matches!(
            load_project(&project),
            Err(ArtifactLoadError::Decode {
                kind: ArtifactKind::Model,
                ..
            })
        ));

        fs::write(
            &project.model_path,
            r#"{"kind": "linear", "coefficients": {}}"#,
        )
        .unwrap();
        fs::write(&project.features_path, r#"["Ram", "Ram"]"#).unwrap();

        assert!(matches!(
            load_project(&project),
            Err(ArtifactLoadError::Schema {
                source: SchemaError::DuplicateColumn(_),
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_project() {
        let store = ModelStore::new(Vec::new());
        assert!(matches!(
            store.load("Weather"),
            Err(ArtifactLoadError::UnknownProject(name)) if name == "Weather"
        ));
    }
}
