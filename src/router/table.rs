use std::collections::HashMap;

/// Immutable routing snapshot built from the configuration file.
///
/// A reload builds a new table and swaps it in whole; handlers keep the
/// `Arc` they started with for the lifetime of a request.
#[derive(Debug, Clone)]
pub struct RouteTable {
    secret: String,
    ticket_url: String,
    listen: String,
    /// Keyed by lowercase project key
    projects: HashMap<String, Vec<OutboundTarget>>,
}

/// A single chat endpoint configured for a project
#[derive(Debug, Clone)]
pub struct OutboundTarget {
    /// Incoming-webhook URL of the chat service
    pub webhook_url: String,

    /// Overrides the global ticket URL for links built for this target
    pub ticket_url: Option<String>,

    /// When set, only matching events are sent to this target
    pub on_events: Option<EventFilter>,
}

/// Event-type filter from `on_events`.
///
/// Tokens are lowercase and compared against both the short verb
/// (`created`) and the full Jira event name (`jira:issue_created`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter(Vec<String>);

impl EventFilter {
    /// Build a filter from raw tokens. Returns `None` when no usable token
    /// remains, which means the target accepts every event.
    pub fn new<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            None
        } else {
            Some(Self(tokens))
        }
    }

    pub fn matches(&self, verb: &str, webhook_event: &str) -> bool {
        self.0
            .iter()
            .any(|t| t.eq_ignore_ascii_case(verb) || t.eq_ignore_ascii_case(webhook_event))
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

impl OutboundTarget {
    pub fn accepts(&self, verb: &str, webhook_event: &str) -> bool {
        self.on_events
            .as_ref()
            .is_none_or(|f| f.matches(verb, webhook_event))
    }

    /// The per-target ticket URL, falling back to the global default
    pub fn effective_ticket_url<'a>(&'a self, default: &'a str) -> &'a str {
        self.ticket_url.as_deref().unwrap_or(default)
    }
}

impl RouteTable {
    pub fn new(
        secret: String,
        ticket_url: String,
        listen: String,
        projects: HashMap<String, Vec<OutboundTarget>>,
    ) -> Self {
        let projects = projects
            .into_iter()
            .map(|(key, targets)| (key.to_lowercase(), targets))
            .collect();

        Self {
            secret,
            ticket_url,
            listen,
            projects,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn ticket_url(&self) -> &str {
        &self.ticket_url
    }

    pub fn listen(&self) -> &str {
        &self.listen
    }

    /// Case-insensitive lookup of the targets for a project.
    /// A project configured with an empty list counts as unconfigured.
    pub fn targets(&self, project_key: &str) -> Option<&[OutboundTarget]> {
        self.projects
            .get(&project_key.to_lowercase())
            .map(Vec::as_slice)
            .filter(|targets| !targets.is_empty())
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}
