use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use mri_chat::ConversationTurn;
use mri_chat::ErrorKind;
use serde::Deserialize;
use tracing::error;
use tracing::info;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ConversationTurn>,
}

/// Body is always a JSON array: the assistant turn on success, empty otherwise.
pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Json<Vec<ConversationTurn>>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed chat request");
            return (StatusCode::BAD_REQUEST, Json(Vec::new()));
        }
    };

    // a dropped request future cancels its outbound calls
    let cancel = state.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();

    match state.pipeline.answer(&request.messages, &cancel).await {
        Ok(outcome) => {
            info!(
                sources = outcome.sources.len(),
                no_answer = outcome.no_answer,
                "Chat reply sent"
            );
            (StatusCode::OK, Json(vec![outcome.reply]))
        }
        Err(err) => {
            let query = request
                .messages
                .last()
                .map(|turn| turn.content.as_str())
                .unwrap_or_default();
            error!(query, stage = %err.stage(), error = %err, "Chat request failed");
            (status_for(err.kind()), Json(Vec::new()))
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Input => StatusCode::BAD_REQUEST,
        ErrorKind::Retrieval | ErrorKind::Completion | ErrorKind::Cancelled | ErrorKind::Config => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
