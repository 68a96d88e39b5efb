use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::ChatMessage;

/// Client for posting messages to chat incoming-webhook endpoints
pub struct ChatClient {
    client: Client,
}

impl ChatClient {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, ChatClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatClientError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    /// POST a message as JSON to a webhook URL.
    ///
    /// Returns the HTTP status code on any response, including non-2xx;
    /// fails only when the request couldn't be completed (connection
    /// failure, DNS, timeout).
    pub async fn post_message(
        &self,
        webhook_url: &str,
        message: &ChatMessage,
    ) -> Result<u16, ChatClientError> {
        debug!(webhook_endpoint = %webhook_url, "Posting chat message");

        let response = self
            .client
            .post(webhook_url)
            .json(message)
            .send()
            .await
            .map_err(|e| ChatClientError::RequestFailed(e.to_string()))?;

        Ok(response.status().as_u16())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}
