use serde::{Deserialize, Serialize};

use crate::jira::{IncomingEvent, Notification};

/// Attachment-style incoming-webhook message (Rocket.Chat / Slack compatible)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Top-level line, e.g. "Issue ABC-1 has been created"
    pub text: String,

    pub attachments: Vec<ChatAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAttachment {
    /// Issue summary
    pub title: String,

    /// Ticket URL followed directly by the issue key
    pub title_link: String,

    /// Message body produced by the classifier
    pub text: String,
}

impl ChatMessage {
    /// Build the message for one target. `ticket_url` is used verbatim as a
    /// prefix of the issue key, so it normally ends with `/browse/`.
    pub fn for_event(event: &IncomingEvent, notification: &Notification, ticket_url: &str) -> Self {
        Self {
            text: format!(
                "Issue {} has been {}",
                event.issue_key, notification.verb
            ),
            attachments: vec![ChatAttachment {
                title: event.issue_summary.clone(),
                title_link: format!("{}{}", ticket_url, event.issue_key),
                text: notification.body.clone(),
            }],
        }
    }
}
