pub mod events;
pub mod models;

pub use events::{Classification, EventVerb, Notification, classify};
pub use models::{ChangelogEntry, IncomingEvent, ParseError};
