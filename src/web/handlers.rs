//! HTTP handlers for the form and the JSON API

use crate::bounds::Bounds;
use crate::config::ProjectConfig;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::RawInputs;
use crate::types::field::InputField;
use crate::types::record::FieldValue;
use crate::types::report::PredictionReport;
use crate::web::error::ApiError;
use crate::web::page::{self, PageView};
use crate::web::AppState;
use axum::{
    extract::{Query, State},
    response::Html,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub project: Option<String>,
}

/// Body of `POST /api/predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub project: String,
    #[serde(default)]
    pub inputs: RawInputs,
}

/// Public view of a configured project
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub bounds: Bounds,
    pub inputs: Vec<InputField>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ApiError> {
    let project = resolve_project(&state, query.project.as_deref())?;
    debug!(project = %project.name, "Rendering form");

    let load_error = probe(&state, &project.name).await?;
    let values = RawInputs::new();

    Ok(Html(page::render(&PageView {
        projects: state.pipeline.store().projects(),
        selected: project,
        values: &values,
        load_error,
        report: None,
    })))
}

/// POST /predict
pub async fn predict_form(
    State(state): State<AppState>,
    Form(mut form): Form<HashMap<String, String>>,
) -> Result<Html<String>, ApiError> {
    let name = form
        .remove("project")
        .ok_or_else(|| ApiError::bad_request("Missing project"))?;
    let project = resolve_project(&state, Some(&name))?;

    let values: RawInputs = form
        .into_iter()
        .map(|(field, value)| (field, FieldValue::Text(value)))
        .collect();

    let report = run(&state, project.name.clone(), values.clone()).await?;

    Ok(Html(page::render(&PageView {
        projects: state.pipeline.store().projects(),
        selected: project,
        values: &values,
        load_error: None,
        report: Some(&report),
    })))
}

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<ProjectSummary>> {
    let projects = state
        .pipeline
        .store()
        .projects()
        .iter()
        .map(|p| ProjectSummary {
            name: p.name.clone(),
            bounds: p.bounds,
            inputs: p.inputs.clone(),
        })
        .collect();

    Json(projects)
}

/// POST /api/predict
pub async fn predict_api(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictionReport>, ApiError> {
    let project = resolve_project(&state, Some(&request.project))?;
    let report = run(&state, project.name.clone(), request.inputs).await?;
    Ok(Json(report))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.pipeline.metrics().snapshot())
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Named project, or the first configured one when no name is given
fn resolve_project<'s>(state: &'s AppState, name: Option<&str>) -> Result<&'s ProjectConfig, ApiError> {
    let store = state.pipeline.store();
    match name {
        Some(name) => store
            .project(name)
            .ok_or_else(|| ApiError::not_found(format!("Project '{}' not found", name))),
        None => store
            .projects()
            .first()
            .ok_or_else(|| ApiError::internal("No projects configured")),
    }
}

/// Prediction cycles do blocking file I/O, keep them off the reactor
async fn run(state: &AppState, project: String, inputs: RawInputs) -> Result<PredictionReport, ApiError> {
    let pipeline = state.pipeline.clone();
    tokio::task::spawn_blocking(move || pipeline.run(&project, &inputs))
        .await
        .map_err(|e| ApiError::internal(format!("Prediction task failed: {}", e)))
}

async fn probe(state: &AppState, project: &str) -> Result<Option<String>, ApiError> {
    let pipeline = state.pipeline.clone();
    let project = project.to_string();
    tokio::task::spawn_blocking(move || pipeline.probe(&project).err().map(|e| e.to_string()))
        .await
        .map_err(|e| ApiError::internal(format!("Artifact check failed: {}", e)))
}
