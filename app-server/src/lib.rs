//! HTTP surface for MRI Learn: the retrieval-augmented chat endpoint and
//! per-learner lesson progress.

mod alert;
mod chat;
mod config;
mod error;
mod identity;
mod progress;
mod state;

pub use alert::WebhookAlerter;
pub use chat::ChatRequest;
pub use config::GeminiSettings;
pub use config::ProgressSettings;
pub use config::ServerConfig;
pub use identity::HeaderIdentity;
pub use identity::IdentityProvider;
pub use state::AppState;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/progress/status", get(progress::status_handler))
        .route("/api/progress/complete", post(progress::complete_handler))
        .route("/api/progress/available", get(progress::available_handler))
        .with_state(state)
}

/// Serve until the state's shutdown token fires, then drain open requests.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let shutdown = state.shutdown_token();
    if let Ok(addr) = listener.local_addr() {
        info!("mri-app-server listening on {addr}");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

async fn health_handler() -> &'static str {
    "ok"
}
