//! Relay Jira issue webhooks to attachment-style chat incoming webhooks.

pub mod chat;
pub mod config;
pub mod jira;
pub mod metrics;
pub mod router;
pub mod routes;
