use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::response::{ok, ok_with_message, AppError};
use crate::routes::{learner_progress, learner_view, parse_body, PositionPayload};
use crate::services::progress::{ActivityEntry, ProgressStats, SessionSummary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_progress))
        .route("/complete", post(complete_resource))
        .route("/reset", post(reset_progress))
        .route("/activity", get(get_activity))
        .route("/session/start", post(start_session))
        .route("/session/end", post(end_session))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletePayload {
    #[serde(alias = "resource_name", alias = "resource")]
    resource_name: Option<String>,
    position: Option<PositionPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetData {
    learner_id: String,
    progress: ProgressStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionEndData {
    session: SessionSummary,
    session_count: u32,
    total_time_spent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityData {
    entries: Vec<ActivityEntry>,
    count: usize,
}

async fn get_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (_, progress) = learner_view(&state, &headers)?;
    let stats = progress.lock().stats(state.catalog());
    Ok(ok(stats))
}

async fn complete_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: CompletePayload = parse_body(&body)?;
    let Some(resource) = payload
        .resource_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
    else {
        return Err(AppError::validation("resourceName is required"));
    };

    let (learner, progress) = learner_progress(&state, &headers)?;
    let outcome = progress.lock().mark_completed(
        &resource,
        payload.position.map(Into::into),
        state.catalog(),
        state.curriculum(),
    );

    match outcome {
        Ok(outcome) => {
            if !outcome.already_completed {
                tracing::info!(
                    learner = %learner,
                    resource = %outcome.resource,
                    score = outcome.score,
                    completed = outcome.completed_count,
                    "resource completed"
                );
            }
            for achievement in &outcome.new_achievements {
                tracing::info!(learner = %learner, achievement = %achievement, "achievement unlocked");
            }
            let message = if outcome.already_completed {
                format!("'{}' was already completed", outcome.resource)
            } else {
                format!("'{}' marked as completed", outcome.resource)
            };
            Ok(ok_with_message(outcome, message))
        }
        Err(err) => {
            tracing::debug!(learner = %learner, resource = %resource, error = %err, "completion rejected");
            Err(err.into())
        }
    }
}

async fn reset_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (learner, progress) = learner_progress(&state, &headers)?;
    state.learners().reset(&learner);
    let stats = progress.lock().stats(state.catalog());
    Ok(ok_with_message(
        ResetData {
            learner_id: learner,
            progress: stats,
        },
        "progress reset",
    ))
}

async fn get_activity(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (_, progress) = learner_view(&state, &headers)?;
    let entries: Vec<ActivityEntry> = progress.lock().activity().cloned().collect();
    Ok(ok(ActivityData {
        count: entries.len(),
        entries,
    }))
}

async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (learner, progress) = learner_progress(&state, &headers)?;
    let change = progress.lock().start_session();
    tracing::info!(
        learner = %learner,
        session = change.started.number,
        closed_previous = change.ended.is_some(),
        "learning session started"
    );
    Ok(ok_with_message(change, "session started"))
}

async fn end_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (learner, progress) = learner_progress(&state, &headers)?;
    let mut progress = progress.lock();
    let session = progress.end_session()?;
    tracing::info!(
        learner = %learner,
        session = session.number,
        seconds = session.duration_seconds,
        "learning session ended"
    );
    Ok(ok_with_message(
        SessionEndData {
            session,
            session_count: progress.session_count(),
            total_time_spent: progress.total_time_spent(),
        },
        "session ended",
    ))
}
