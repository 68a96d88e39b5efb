use axum::{
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::jira::{Classification, IncomingEvent, classify};

use super::AppState;

/// Handle incoming Jira webhook events
///
/// This endpoint:
/// 1. Checks the secret path segment against the current configuration
/// 2. Extracts the fields of interest from the payload
/// 3. Classifies the event and, for known events, posts a chat message to
///    every target configured for the issue's project
///
/// The caller only ever sees 200, or 500 when the body can't be read or parsed;
/// chat delivery failures are logged and never surface here.
pub async fn handle_jira_event(
    State(state): State<Arc<AppState>>,
    Path(secret): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    // One snapshot for the whole request
    let table = state.router.snapshot();

    if secret != table.secret() {
        warn!("Webhook received with unknown secret path");
        return StatusCode::NOT_FOUND.into_response();
    }

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, status = %e.status(), "Failed to read Jira webhook body");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 - could not read webhook body",
            )
                .into_response();
        }
    };

    let event = match IncomingEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "Failed to parse Jira webhook payload");
            debug!(body = %String::from_utf8_lossy(&body), "Raw payload that failed to parse");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 - could not parse webhook payload",
            )
                .into_response();
        }
    };

    if event.webhook_event.is_empty() {
        error!("webhookEvent field not found");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "500 - webhookEvent field not found",
        )
            .into_response();
    }

    debug!(
        jira_event = %event.webhook_event,
        jira_project = %event.project_key,
        issue_key = %event.issue_key,
        "Received Jira event"
    );

    match classify(&event) {
        Classification::Notify(notification) => {
            if state
                .router
                .route_event(&table, &event, &notification)
                .await
                .is_some()
            {
                state.metrics.record_project(&event.project_key.to_lowercase());
            }
            state.metrics.webhooks_processed.inc();
        }
        Classification::EmptyChangelog => {
            warn!(
                jira_event = %event.webhook_event,
                jira_project = %event.project_key,
                issue_key = %event.issue_key,
                "Empty changelog - skipping"
            );
        }
        Classification::Unknown => {
            warn!(
                jira_event = %event.webhook_event,
                "Unknown JIRA event received. Skipping."
            );
            state.metrics.unknown_webhooks.inc();
        }
    }

    debug!(jira_event = %event.webhook_event, "Webhook processed");
    StatusCode::OK.into_response()
}
