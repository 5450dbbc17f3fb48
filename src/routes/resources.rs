use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::response::{ok, AppError};
use crate::routes::learner_view;
use crate::services::catalog::{GridSize, ResourceKind};
use crate::services::recommendation::available_resources;
use crate::state::AppState;

const DEFAULT_AVAILABLE_LIMIT: usize = 3;
const MAX_AVAILABLE_LIMIT: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_resources))
        .route("/available", get(list_available))
        .route("/:name/prerequisites", get(get_prerequisites))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceDto {
    name: String,
    x: u32,
    y: u32,
    #[serde(rename = "type")]
    kind: ResourceKind,
    completed: bool,
    available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceListData {
    resources: Vec<ResourceDto>,
    grid_size: GridSize,
    total: usize,
    completed_count: usize,
}

#[derive(Debug, Deserialize)]
struct AvailableQuery {
    limit: Option<String>,
}

impl AvailableQuery {
    fn limit(&self) -> Result<usize, AppError> {
        match self.limit.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            None => Ok(DEFAULT_AVAILABLE_LIMIT),
            Some(raw) => raw
                .parse::<usize>()
                .map(|limit| limit.min(MAX_AVAILABLE_LIMIT))
                .map_err(|_| AppError::validation("limit must be a non-negative integer")),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailableData {
    resources: Vec<String>,
    count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrerequisiteDto {
    name: String,
    completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrerequisitesData {
    resource: String,
    prerequisites: Vec<PrerequisiteDto>,
    missing: Vec<String>,
    available: bool,
    completed: bool,
}

async fn list_resources(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (_, progress) = learner_view(&state, &headers)?;
    let progress = progress.lock();
    let completed = progress.completed();
    let curriculum = state.curriculum();
    let catalog = state.catalog();

    let resources: Vec<ResourceDto> = catalog
        .positions()
        .into_iter()
        .map(|(name, position)| ResourceDto {
            name: name.to_string(),
            x: position.x,
            y: position.y,
            kind: catalog.get(name).map(|r| r.kind).unwrap_or_default(),
            completed: completed.contains(name),
            available: curriculum.is_available(name, completed),
        })
        .collect();

    Ok(ok(ResourceListData {
        total: resources.len(),
        completed_count: resources.iter().filter(|r| r.completed).count(),
        grid_size: catalog.grid(),
        resources,
    }))
}

async fn list_available(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AvailableQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit()?;
    let (_, progress) = learner_view(&state, &headers)?;
    let progress = progress.lock();

    let resources: Vec<String> = available_resources(
        state.catalog(),
        state.curriculum(),
        progress.completed(),
        limit,
    )
    .into_iter()
    .map(str::to_string)
    .collect();

    Ok(ok(AvailableData {
        count: resources.len(),
        resources,
    }))
}

async fn get_prerequisites(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let curriculum = state.curriculum();
    let prerequisites = curriculum.prerequisites(&name);
    if !state.catalog().contains(&name) && prerequisites.is_empty() {
        return Err(AppError::not_found(format!("resource not found: {name}")));
    }

    let (_, progress) = learner_view(&state, &headers)?;
    let progress = progress.lock();
    let completed = progress.completed();

    Ok(ok(PrerequisitesData {
        prerequisites: prerequisites
            .iter()
            .map(|p| PrerequisiteDto {
                name: p.clone(),
                completed: completed.contains(p),
            })
            .collect(),
        missing: curriculum.missing_prerequisites(&name, completed),
        available: curriculum.is_available(&name, completed),
        completed: completed.contains(&name),
        resource: name,
    }))
}
