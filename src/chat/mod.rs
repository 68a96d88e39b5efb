pub mod client;
pub mod models;

pub use client::{ChatClient, ChatClientError};
pub use models::{ChatAttachment, ChatMessage};
