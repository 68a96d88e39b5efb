pub mod jira;

pub use jira::handle_jira_event;

use crate::metrics::RelayMetrics;
use crate::router::ChatRouter;
use axum::{
    Router as AxumRouter,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::error;

pub const WELCOME: &str = "Welcome to the JIRA webhook to chat bridge\n";

/// Jira payloads embed full descriptions and comments, well past axum's 2 MB default
pub const MAX_WEBHOOK_BODY: usize = 32 * 1024 * 1024;

/// Application state shared across handlers
pub struct AppState {
    pub router: Arc<ChatRouter>,
    pub metrics: RelayMetrics,
}

/// Build the HTTP router
pub fn app(state: Arc<AppState>) -> AxumRouter {
    AxumRouter::new()
        .route("/", get(app_info))
        .route(
            "/{secret}/jira",
            post(handle_jira_event).layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY)),
        )
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .fallback(not_found)
        .with_state(state)
}

/// Root info endpoint
pub async fn app_info() -> &'static str {
    WELCOME
}

/// Liveness endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
