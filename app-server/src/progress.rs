use crate::error::AppError;
use crate::state::AppState;
use axum::Json;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use mri_progress_store::normalize_slug;
use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::warn;

const UNAVAILABLE_ALERT: &str = "[DB ERROR] /api/progress/available failed to connect to database.";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusQuery {
    slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    completed: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteRequest {
    slug: Option<String>,
}

fn require_user(state: &AppState, headers: &HeaderMap) -> Result<String, AppError> {
    state
        .identity
        .user_id(headers)
        .ok_or_else(AppError::unauthorized)
}

pub(crate) async fn status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    let user_id = require_user(&state, &headers)?;
    let slug = query
        .slug
        .as_deref()
        .and_then(normalize_slug)
        .ok_or(AppError::bad_request("Missing slug"))?;

    let completed = state
        .progress
        .is_completed(&user_id, slug)
        .await
        .map_err(|err| {
            error!(slug, error = %err, "Progress lookup failed");
            AppError::unavailable("Database error")
        })?;
    Ok(Json(StatusResponse { completed }))
}

pub(crate) async fn complete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<&'static str, AppError> {
    let user_id = require_user(&state, &headers)?;
    let request = payload.map_err(|_| AppError::bad_request("Invalid slug"))?;
    let slug = request
        .slug
        .as_deref()
        .and_then(normalize_slug)
        .ok_or(AppError::bad_request("Invalid slug"))?;

    state
        .progress
        .mark_completed(&user_id, slug)
        .await
        .map_err(|err| {
            error!(slug, error = %err, "Failed to record completion");
            AppError::unavailable("Database unavailable")
        })?;
    Ok("OK")
}

pub(crate) async fn available_handler(
    State(state): State<AppState>,
) -> Result<&'static str, AppError> {
    let reason = match tokio::time::timeout(state.availability_timeout, state.progress.ping()).await
    {
        Ok(Ok(())) => return Ok("OK"),
        Ok(Err(err)) => err.to_string(),
        Err(_) => format!(
            "no answer within {}ms",
            state.availability_timeout.as_millis()
        ),
    };

    warn!(reason = %reason, "Progress store unavailable");
    state.alerter.send(UNAVAILABLE_ALERT).await;
    Err(AppError::unavailable("Database unavailable"))
}
