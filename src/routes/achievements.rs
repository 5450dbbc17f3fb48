use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::response::{ok, AppError};
use crate::routes::learner_view;
use crate::services::progress::AchievementStatus;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_achievements))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementsData {
    achievements: Vec<AchievementStatus>,
    unlocked_count: usize,
    total_count: usize,
}

async fn list_achievements(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (_, progress) = learner_view(&state, &headers)?;
    let achievements = progress.lock().achievement_states(state.catalog());

    Ok(ok(AchievementsData {
        unlocked_count: achievements.iter().filter(|a| a.unlocked).count(),
        total_count: achievements.len(),
        achievements,
    }))
}
