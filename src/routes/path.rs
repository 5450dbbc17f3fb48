use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use serde::Deserialize;

use crate::response::{ok, AppError};
use crate::routes::{learner_progress, parse_body, PositionPayload};
use crate::services::recommendation::suggest;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/suggest", post(suggest_path))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestPayload {
    #[serde(alias = "current_position", alias = "position")]
    current_position: Option<PositionPayload>,
    goal: Option<String>,
}

async fn suggest_path(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: SuggestPayload = parse_body(&body)?;
    let (learner, progress) = learner_progress(&state, &headers)?;

    let suggestion = {
        let mut progress = progress.lock();
        suggest(
            state.planner(),
            state.catalog(),
            state.curriculum(),
            &mut progress,
            payload.current_position.map(Into::into),
            payload.goal.as_deref(),
        )
    };

    let moves = suggestion
        .path
        .iter()
        .filter(|step| !step.action.is_terminal())
        .count();
    tracing::info!(
        learner = %learner,
        goal = %suggestion.goal,
        next = suggestion.next_resource.as_deref().unwrap_or("-"),
        moves,
        terminal = moves < suggestion.path.len(),
        "path suggested"
    );

    Ok(ok(suggestion))
}
