//! Demo Artifact Writer
//!
//! Writes small deterministic model and feature-list artifacts for the
//! default projects so the server can be tried without a training run.
//!
//! Usage: demo-artifacts [OUTPUT_DIR]   (default: models)

use anyhow::{Context, Result};
use multi_predicto::config::{default_projects, ProjectConfig};
use multi_predicto::models::aggregator::Aggregation;
use multi_predicto::models::loader::load_project;
use multi_predicto::models::regressor::{
    LinearModel, Model, Node, Tree, TreeEnsemble, VotingMember, VotingModel,
};
use multi_predicto::types::field::Widget;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("demo_artifacts=info".parse()?),
        )
        .init();

    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "models".to_string());
    info!(out_dir = %out_dir, "Writing demo artifacts");

    for project in write_all(Path::new(&out_dir))? {
        info!(
            project = %project.name,
            model = %project.model_path.display(),
            features = %project.features_path.display(),
            "Artifacts written"
        );
    }

    Ok(())
}

/// Write artifacts for every default project into `dir`, then load each
/// pair back to make sure the server will accept it.
fn write_all(dir: &Path) -> Result<Vec<ProjectConfig>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for mut project in default_projects() {
        let model = match demo_model(&project.name) {
            Some(model) => model,
            None => continue,
        };

        project.model_path = relocate(dir, &project.model_path);
        project.features_path = relocate(dir, &project.features_path);

        write_json(&project.model_path, &model)?;
        write_json(&project.features_path, &schema_columns(&project))?;

        load_project(&project)
            .with_context(|| format!("Written artifacts for '{}' do not load", project.name))?;
        written.push(project);
    }

    Ok(written)
}

fn relocate(dir: &Path, path: &Path) -> std::path::PathBuf {
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.join(path),
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Training columns as one-hot encoding would produce them: numeric fields
/// keep their name, choice fields expand to `<field>_<option>`.
fn schema_columns(project: &ProjectConfig) -> Vec<String> {
    let mut columns = Vec::new();
    for field in &project.inputs {
        match &field.widget {
            Widget::Number { .. } => columns.push(field.name.clone()),
            Widget::Choice { options, .. } => {
                columns.extend(options.iter().map(|o| format!("{}_{}", field.name, o)));
            }
        }
    }
    columns
}

fn demo_model(project: &str) -> Option<Model> {
    match project {
        "Laptop Prices" => Some(Model::Linear(laptop_model())),
        "Mobile Prices" => Some(Model::TreeEnsemble(mobile_model())),
        "Crypto Prices" => Some(Model::Voting(crypto_model())),
        _ => None,
    }
}

fn linear(intercept: f64, weights: &[(&str, f64)]) -> LinearModel {
    LinearModel {
        intercept,
        coefficients: weights
            .iter()
            .map(|(name, w)| (name.to_string(), *w))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn split(feature: &str, threshold: f64, left: usize, right: usize) -> Node {
    Node::Split {
        feature: feature.to_string(),
        threshold,
        left,
        right,
    }
}

fn leaf(value: f64) -> Node {
    Node::Leaf { value }
}

fn laptop_model() -> LinearModel {
    linear(
        150.0,
        &[
            ("Company_Apple", 450.0),
            ("Company_Dell", 60.0),
            ("Company_HP", 20.0),
            ("TypeName_Gaming", 350.0),
            ("TypeName_Ultrabook", 250.0),
            ("Ram", 45.0),
            ("SSD", 0.35),
            ("HDD", 0.05),
            ("Weight", -40.0),
            ("Inches", 12.0),
            ("Touch_Yes", 80.0),
        ],
    )
}

/// Boosted trees: each tree adds a correction to the base price
fn mobile_model() -> TreeEnsemble {
    TreeEnsemble {
        base_score: 150.0,
        aggregation: Aggregation::Sum,
        trees: vec![
            Tree {
                nodes: vec![split("RAM", 6.0, 1, 2), leaf(0.0), leaf(150.0)],
            },
            Tree {
                nodes: vec![split("Brand_Apple", 0.5, 1, 2), leaf(0.0), leaf(400.0)],
            },
            Tree {
                nodes: vec![
                    split("Storage", 128.0, 1, 2),
                    leaf(0.0),
                    split("Storage", 512.0, 3, 4),
                    leaf(120.0),
                    leaf(300.0),
                ],
            },
        ],
    }
}

fn crypto_model() -> VotingModel {
    let forest = TreeEnsemble {
        base_score: 0.0,
        aggregation: Aggregation::Mean,
        trees: vec![
            Tree {
                nodes: vec![split("Symbol_BTC", 0.5, 1, 2), leaf(100.0), leaf(60000.0)],
            },
            Tree {
                nodes: vec![split("High", 1000.0, 1, 2), leaf(95.0), leaf(30000.0)],
            },
        ],
    };

    VotingModel {
        members: vec![
            VotingMember {
                name: "linear".to_string(),
                weight: 2.0,
                model: Model::Linear(linear(0.0, &[("Open", 0.2), ("High", 0.35), ("Low", 0.35)])),
            },
            VotingMember {
                name: "forest".to_string(),
                weight: 1.0,
                model: Model::TreeEnsemble(forest),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multi_predicto::feature_aligner::align;
    use multi_predicto::models::Regressor;
    use multi_predicto::pipeline::{build_record, RawInputs};

    #[test]
    fn test_artifacts_load_and_predict_within_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let projects = write_all(dir.path()).unwrap();
        assert_eq!(projects.len(), 3);

        for project in &projects {
            let loaded = load_project(project).unwrap();
            let record = build_record(project, &RawInputs::new()).unwrap();
            let row = align(&record, Some(&loaded.schema)).unwrap();
            assert!(row.unseen_categories().is_empty());

            let value = loaded.model.predict_row(&row).unwrap();
            assert!(project.bounds.contains(value), "{}: {}", project.name, value);
        }
    }

    #[test]
    fn test_schema_expands_choices() {
        let laptop = &default_projects()[0];
        let columns = schema_columns(laptop);

        assert_eq!(&columns[..4], ["Company_Dell", "Company_HP", "Company_Lenovo", "Company_Apple"]);
        assert!(columns.contains(&"Ram".to_string()));
        assert!(columns.contains(&"Touch_No".to_string()));
    }
}
