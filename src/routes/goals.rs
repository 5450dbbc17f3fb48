use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::Router;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::response::{ok, AppError};
use crate::routes::{learner_progress, learner_view, parse_body};
use crate::services::recommendation::recommend_next;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goals))
        .route("/current", put(set_goal))
}

#[derive(Debug, Default, Deserialize)]
struct SetGoalPayload {
    goal: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalDto {
    id: String,
    resources: Vec<String>,
    completed_count: usize,
    total: usize,
    next_resource: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalsData {
    current_goal: String,
    default_goal: String,
    goals: Vec<GoalDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrentGoalData {
    current_goal: String,
    resources: Vec<String>,
}

async fn list_goals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (_, progress) = learner_view(&state, &headers)?;
    let progress = progress.lock();
    let completed = progress.completed();
    let curriculum = state.curriculum();

    let goals = curriculum
        .paths()
        .iter()
        .map(|path| GoalDto {
            id: path.id.clone(),
            completed_count: path
                .resources
                .iter()
                .filter(|r| completed.contains(*r))
                .count(),
            total: path.resources.len(),
            next_resource: recommend_next(state.catalog(), curriculum, completed, &path.id)
                .map(str::to_string),
            resources: path.resources.clone(),
        })
        .collect();

    Ok(ok(GoalsData {
        current_goal: progress.goal().to_string(),
        default_goal: curriculum.default_goal().to_string(),
        goals,
    }))
}

async fn set_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: SetGoalPayload = parse_body(&body)?;
    let Some(goal) = payload.goal.filter(|g| !g.trim().is_empty()) else {
        return Err(AppError::validation("goal is required"));
    };

    let (learner, progress) = learner_progress(&state, &headers)?;
    let mut progress = progress.lock();
    progress.set_goal(&goal, state.curriculum())?;
    tracing::info!(learner = %learner, goal = %progress.goal(), "learning goal set");

    Ok(ok(CurrentGoalData {
        current_goal: progress.goal().to_string(),
        resources: state.curriculum().learning_path(progress.goal()).to_vec(),
    }))
}
