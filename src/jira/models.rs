use serde_json::Value;

/// The fields of a Jira webhook that drive a chat notification.
///
/// Every field is extracted independently: anything missing (or not a
/// string) is left empty instead of failing the whole payload. Jira sends
/// many event shapes and only a handful of fields matter here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingEvent {
    /// The event type sent by Jira (e.g., "jira:issue_created")
    pub webhook_event: String,

    /// `user.displayName` of the actor
    pub display_name: String,

    /// `issue.key` (e.g., "ABC-1")
    pub issue_key: String,

    /// `issue.fields.summary`
    pub issue_summary: String,

    /// `issue.fields.project.key`, as sent by Jira
    pub project_key: String,

    /// `issue.fields.project.avatarUrls["24x24"]`
    pub project_avatar: String,

    /// First entry of `changelog.items`, present only for field changes
    pub changelog: Option<ChangelogEntry>,
}

/// A single field change from an `issue_updated` event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub field: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("webhook body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl IncomingEvent {
    /// Parse a raw webhook body.
    ///
    /// Fails only when the body cannot be read as JSON at all; a document
    /// without `webhookEvent` parses fine and is rejected by the caller.
    pub fn parse(body: &[u8]) -> Result<Self, ParseError> {
        let root: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(&root))
    }

    /// Extract the fields of interest from an already-parsed document
    pub fn from_value(root: &Value) -> Self {
        Self {
            webhook_event: string_at(root, "/webhookEvent"),
            display_name: string_at(root, "/user/displayName"),
            issue_key: string_at(root, "/issue/key"),
            issue_summary: string_at(root, "/issue/fields/summary"),
            project_key: string_at(root, "/issue/fields/project/key"),
            project_avatar: string_at(root, "/issue/fields/project/avatarUrls/24x24"),
            changelog: first_changelog_entry(root),
        }
    }
}

/// String value at a JSON pointer, or empty when absent or not a string
fn string_at(root: &Value, pointer: &str) -> String {
    root.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Only the first changelog item is reported. An item without a field name
/// carries nothing worth announcing and counts as no changelog.
fn first_changelog_entry(root: &Value) -> Option<ChangelogEntry> {
    let item = root.pointer("/changelog/items/0")?;
    let field = string_at(item, "/field");
    if field.is_empty() {
        return None;
    }

    Some(ChangelogEntry {
        field,
        from: string_at(item, "/fromString"),
        to: string_at(item, "/toString"),
    })
}
