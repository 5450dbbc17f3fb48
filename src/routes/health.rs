use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/info", get(info))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    resources: usize,
    catalog: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: &'static str,
    start_time: String,
    uptime: u64,
    learners: usize,
    max_learners: usize,
    goals: Vec<String>,
    default_goal: String,
    grid_size_x: u32,
    grid_size_y: u32,
    max_path_steps: usize,
    tie_break: &'static str,
}

/// Reports `degraded` when the catalog failed to load; the service still answers.
async fn root(State(state): State<AppState>) -> Response {
    let resources = state.catalog().len();
    let loaded = resources > 0;
    let response = HealthResponse {
        status: if loaded { "ok" } else { "degraded" },
        timestamp: now_iso(),
        resources,
        catalog: if loaded { "loaded" } else { "empty" },
    };
    (StatusCode::OK, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    })
    .into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    let planner = state.planner().config();
    let response = HealthInfoResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        start_time: DateTime::<Utc>::from(state.started_at_system())
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime_seconds(),
        learners: state.learners().len(),
        max_learners: state.learners().capacity(),
        goals: state.curriculum().goal_ids(),
        default_goal: state.curriculum().default_goal().to_string(),
        grid_size_x: planner.grid_size_x,
        grid_size_y: planner.grid_size_y,
        max_path_steps: planner.max_steps,
        tie_break: planner.tie_break.as_str(),
    };
    Json(response).into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
