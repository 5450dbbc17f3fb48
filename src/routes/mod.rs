mod achievements;
mod goals;
mod health;
mod path;
mod progress;
mod resources;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::response::{json_error, AppError};
use crate::services::catalog::GridPosition;
use crate::services::learners::{is_valid_learner_id, DEFAULT_LEARNER};
use crate::services::progress::Progress;
use crate::state::AppState;

pub const LEARNER_HEADER: &str = "x-learner-id";

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/resources", resources::router())
        .nest("/api/progress", progress::router())
        .nest("/api/achievements", achievements::router())
        .nest("/api/goals", goals::router())
        .nest("/api/path", path::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Endpoint not found").into_response()
}

/// Learner addressed by the request; requests without the header share `default`.
pub(crate) fn learner_id(headers: &HeaderMap) -> Result<String, AppError> {
    let Some(raw) = headers.get(LEARNER_HEADER) else {
        return Ok(DEFAULT_LEARNER.to_string());
    };
    let id = raw
        .to_str()
        .map(str::trim)
        .map_err(|_| AppError::validation("learner id must be ASCII"))?;
    if id.is_empty() {
        return Ok(DEFAULT_LEARNER.to_string());
    }
    if !is_valid_learner_id(id) {
        return Err(AppError::validation(
            "learner id may only contain letters, digits, '-', '_' or '.' (max 64)",
        ));
    }
    Ok(id.to_string())
}

pub(crate) fn learner_progress(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(String, Arc<Mutex<Progress>>), AppError> {
    let id = learner_id(headers)?;
    let progress = state.learners().get_or_create(&id);
    Ok((id, progress))
}

/// Read-only access: unknown learners get a fresh, unregistered progress.
pub(crate) fn learner_view(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(String, Arc<Mutex<Progress>>), AppError> {
    let id = learner_id(headers)?;
    let progress = state.learners().view(&id);
    Ok((id, progress))
}

/// Parses a JSON body; an empty body yields `T::default()`.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| {
        tracing::debug!(error = %err, "rejecting malformed request body");
        AppError::bad_request(format!("invalid JSON body: {err}"))
    })
}

/// Grid position as sent by clients; negative coordinates clamp to zero.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct PositionPayload {
    x: i64,
    y: i64,
}

impl From<PositionPayload> for GridPosition {
    fn from(p: PositionPayload) -> Self {
        GridPosition::new(
            p.x.clamp(0, u32::MAX as i64) as u32,
            p.y.clamp(0, u32::MAX as i64) as u32,
        )
    }
}
