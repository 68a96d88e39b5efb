use std::fmt;

use super::IncomingEvent;

pub const ISSUE_CREATED: &str = "jira:issue_created";
pub const ISSUE_UPDATED: &str = "jira:issue_updated";

/// What happened to the issue, as shown in the chat text line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventVerb {
    Created,
    Updated,
}

impl EventVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventVerb::Created => "created",
            EventVerb::Updated => "updated",
        }
    }
}

impl fmt::Display for EventVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message ready to be sent to the project's chat targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub body: String,
    pub verb: EventVerb,
}

/// Outcome of classifying an incoming event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A known event with something to say
    Notify(Notification),

    /// `issue_updated` without a changelog entry; nothing to announce
    EmptyChangelog,

    /// Any event type we don't announce
    Unknown,
}

/// Map an event to a chat message, or to an explicit reason for dropping it
pub fn classify(event: &IncomingEvent) -> Classification {
    match event.webhook_event.as_str() {
        ISSUE_CREATED => Classification::Notify(Notification {
            body: format!("By {}", event.display_name),
            verb: EventVerb::Created,
        }),
        ISSUE_UPDATED => match &event.changelog {
            Some(change) => Classification::Notify(Notification {
                body: format!(
                    "{} changed field {}: {} -> {}",
                    event.display_name, change.field, change.from, change.to
                ),
                verb: EventVerb::Updated,
            }),
            None => Classification::EmptyChangelog,
        },
        _ => Classification::Unknown,
    }
}
