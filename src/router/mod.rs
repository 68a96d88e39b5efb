pub mod table;

pub use table::{EventFilter, OutboundTarget, RouteTable};

use crate::chat::{ChatClient, ChatMessage};
use crate::config::{ConfigError, ConfigLoader};
use crate::jira::{IncomingEvent, Notification};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

/// Result of one dispatch attempt towards a single target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    /// The webhook URL that was (or would have been) called
    pub webhook_url: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The chat service answered, with any status code
    Delivered { status: u16 },

    /// The request never completed (connection failure, timeout)
    Failed { error: String },

    /// The target's `on_events` filter excluded this event
    Skipped,
}

/// Send a message to a single webhook URL.
/// Errors are logged but do not propagate - other targets should still receive the event.
pub async fn deliver(
    client: &ChatClient,
    webhook_url: &str,
    event: &IncomingEvent,
    message: &ChatMessage,
) -> DeliveryOutcome {
    match client.post_message(webhook_url, message).await {
        Ok(status) if (200..300).contains(&status) => {
            info!(
                jira_project = %event.project_key,
                issue_key = %event.issue_key,
                webhook_endpoint = %webhook_url,
                status,
                "Webhook sent"
            );
            DeliveryOutcome::Delivered { status }
        }
        Ok(status) => {
            warn!(
                jira_project = %event.project_key,
                issue_key = %event.issue_key,
                webhook_endpoint = %webhook_url,
                status,
                "Chat webhook returned non-success status"
            );
            DeliveryOutcome::Delivered { status }
        }
        Err(e) => {
            error!(
                jira_project = %event.project_key,
                issue_key = %event.issue_key,
                webhook_endpoint = %webhook_url,
                error = %e,
                "Webhook sending failed (continuing to other targets)"
            );
            DeliveryOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// The routing engine: owns the current route table snapshot and posts
/// notifications to every target configured for a project.
pub struct ChatRouter {
    /// Current configuration; replaced whole on reload
    table: RwLock<Arc<RouteTable>>,

    /// Shared HTTP client for chat endpoints
    chat_client: Arc<ChatClient>,

    /// Source the table is reloaded from
    loader: ConfigLoader,
}

impl ChatRouter {
    pub fn new(table: RouteTable, chat_client: Arc<ChatClient>, loader: ConfigLoader) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
            chat_client,
            loader,
        }
    }

    /// The table in effect right now. Callers keep this `Arc` for the whole
    /// request so a concurrent reload is never observed halfway.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.read().clone()
    }

    /// Re-read the configuration file and swap in the new table.
    /// On failure the previous table stays in effect.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let new_table = self.loader.load()?;

        let previous_listen = self.snapshot().listen().to_string();
        if new_table.listen() != previous_listen {
            warn!(
                current = %previous_listen,
                configured = %new_table.listen(),
                "general.listen changed - restart required to apply"
            );
        }

        info!(
            projects = new_table.project_count(),
            "Route table reloaded"
        );
        *self.table.write() = Arc::new(new_table);

        Ok(())
    }

    /// Start the background task that reloads the configuration file when
    /// its modification time changes. An interval of zero disables reloading.
    pub fn start_reload_task(self: Arc<Self>, interval_secs: u64) {
        if interval_secs == 0 {
            info!("Configuration hot reload disabled");
            return;
        }

        let router = self.clone();
        tokio::spawn(async move {
            let mut last_modified: Option<SystemTime> = router.loader.modified();
            let mut ticker = interval(Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let modified = router.loader.modified();
                if modified == last_modified {
                    continue;
                }
                last_modified = modified;

                info!(
                    path = %router.loader.path().display(),
                    "Configuration file changed, reloading configuration"
                );
                if let Err(e) = router.reload() {
                    error!(error = %e, "Failed to reload configuration - keeping previous");
                }
            }
        });
    }

    /// Send a notification to every target configured for the event's project.
    ///
    /// Returns `None` when the project has no targets. Targets are tried in
    /// configuration order; a failing target does not stop the others.
    pub async fn route_event(
        &self,
        table: &RouteTable,
        event: &IncomingEvent,
        notification: &Notification,
    ) -> Option<Vec<DeliveryAttempt>> {
        let Some(targets) = table.targets(&event.project_key) else {
            warn!(
                jira_event = %event.webhook_event,
                jira_project = %event.project_key,
                issue_key = %event.issue_key,
                "JIRA project not found in configuration"
            );
            return None;
        };

        info!(
            jira_event = %event.webhook_event,
            jira_project = %event.project_key,
            issue_key = %event.issue_key,
            target_count = targets.len(),
            "Known JIRA event received and matching project config found"
        );

        let verb = notification.verb.as_str();
        let mut attempts = Vec::with_capacity(targets.len());

        for target in targets {
            if !target.accepts(verb, &event.webhook_event) {
                info!(
                    jira_project = %event.project_key,
                    issue_key = %event.issue_key,
                    webhook_endpoint = %target.webhook_url,
                    "Skipping outgoing webhook - event not in on_events"
                );
                attempts.push(DeliveryAttempt {
                    webhook_url: target.webhook_url.clone(),
                    outcome: DeliveryOutcome::Skipped,
                });
                continue;
            }

            let ticket_url = target.effective_ticket_url(table.ticket_url());
            let message = ChatMessage::for_event(event, notification, ticket_url);

            info!(
                jira_project = %event.project_key,
                issue_key = %event.issue_key,
                webhook_endpoint = %target.webhook_url,
                "Sending webhook to chat"
            );

            let outcome = deliver(&self.chat_client, &target.webhook_url, event, &message).await;
            attempts.push(DeliveryAttempt {
                webhook_url: target.webhook_url.clone(),
                outcome,
            });
        }

        Some(attempts)
    }
}
