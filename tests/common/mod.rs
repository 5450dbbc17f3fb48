#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use adaptive_path_backend::services::catalog::{
    GridPosition, GridSize, Resource, ResourceCatalog, ResourceKind,
};
use adaptive_path_backend::services::curriculum::{Curriculum, LearningPath};
use adaptive_path_backend::services::recommendation::{PathPlanner, PlannerConfig};
use adaptive_path_backend::state::AppState;

pub const GRID: GridSize = GridSize { x: 10, y: 10 };

fn resource(name: &str, x: u32, y: u32, kind: ResourceKind) -> Resource {
    Resource {
        name: name.to_string(),
        position: GridPosition::new(x, y),
        kind,
    }
}

/// A(0,0) -> B(3,2) -> C(5,5) on the `basics` path; D(4,0) stands alone on `review`.
pub fn test_catalog() -> ResourceCatalog {
    ResourceCatalog::from_resources(
        vec![
            resource("A", 0, 0, ResourceKind::Lecture),
            resource("B", 3, 2, ResourceKind::Tutorial),
            resource("C", 5, 5, ResourceKind::Quiz),
            resource("D", 4, 0, ResourceKind::Lecture),
        ],
        GRID,
    )
}

pub fn test_curriculum() -> Curriculum {
    let mut prerequisites = HashMap::new();
    prerequisites.insert("B".to_string(), vec!["A".to_string()]);
    prerequisites.insert("C".to_string(), vec!["B".to_string()]);
    let paths = vec![
        LearningPath {
            id: "basics".to_string(),
            resources: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        },
        LearningPath {
            id: "review".to_string(),
            resources: vec!["D".to_string()],
        },
    ];
    Curriculum::new(prerequisites, paths, "basics")
}

pub fn create_test_app() -> Router {
    let state = AppState::new(
        test_catalog(),
        test_curriculum(),
        PathPlanner::new(PlannerConfig::default()),
    );
    adaptive_path_backend::build_app(state)
}

pub fn create_empty_app() -> Router {
    let state = AppState::new(
        ResourceCatalog::empty(GRID),
        test_curriculum(),
        PathPlanner::new(PlannerConfig::default()),
    );
    adaptive_path_backend::build_app(state)
}

/// Same data as [`create_test_app`], with room for only `capacity` learners.
pub fn create_capped_app(capacity: usize) -> Router {
    let state = AppState::new(
        test_catalog(),
        test_curriculum(),
        PathPlanner::new(PlannerConfig::default()),
    )
    .with_learner_capacity(capacity);
    adaptive_path_backend::build_app(state)
}

/// The `basics` path opens with `Ghost`, which has no place on the grid.
pub fn create_ghost_app() -> Router {
    let catalog = ResourceCatalog::from_resources(
        vec![resource("A", 2, 0, ResourceKind::Lecture)],
        GRID,
    );
    let curriculum = Curriculum::new(
        HashMap::new(),
        vec![LearningPath {
            id: "basics".to_string(),
            resources: vec!["Ghost".to_string(), "A".to_string()],
        }],
        "basics",
    );
    let state = AppState::new(
        catalog,
        curriculum,
        PathPlanner::new(PlannerConfig::default()),
    );
    adaptive_path_backend::build_app(state)
}

/// Sends one request and decodes the JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    learner: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(learner) = learner {
        builder = builder.header("x-learner-id", learner);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, learner: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::GET, uri, learner, None).await
}

pub async fn post(
    app: &Router,
    uri: &str,
    learner: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send(app, Method::POST, uri, learner, Some(body)).await
}

pub async fn complete(app: &Router, learner: Option<&str>, resource: &str) -> (StatusCode, Value) {
    post(
        app,
        "/api/progress/complete",
        learner,
        serde_json::json!({ "resourceName": resource }),
    )
    .await
}
