//! Common utilities for integration tests

#![allow(dead_code)]


pub use jira::{
    create_jira_event_payload, create_jira_issue_created_payload,
    create_jira_issue_updated_payload,
};

use jira_chat_notifier::chat::ChatClient;
use jira_chat_notifier::config::ConfigLoader;
use jira_chat_notifier::metrics::RelayMetrics;
use jira_chat_notifier::router::ChatRouter;
use jira_chat_notifier::routes::{AppState, app};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;
use wiremock::MockServer;

/// Secret used in every test configuration
pub const SECRET: &str = "t0ps3cret";

/// Default ticket URL used in every test configuration
pub const TICKET_URL: &str = "http://t/";

/// A running app plus the mock chat service it posts to
pub struct TestEnvironment {
    pub base_url: String,
    pub chat: MockServer,
    pub http_client: reqwest::Client,
    pub router: Arc<ChatRouter>,
    config_file: NamedTempFile,
    server: JoinHandle<()>,
}

impl TestEnvironment {
    /// Start the app with a `projects:` YAML block. `{chat}` in the block is
    /// replaced with the mock chat server's base URL.
    pub async fn start(projects_yaml: &str) -> Self {
        let chat = MockServer::start().await;

        let config_file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("Failed to create config file");
        std::fs::write(config_file.path(), render_config(SECRET, projects_yaml, &chat.uri()))
            .expect("Failed to write config file");

        let loader = ConfigLoader::new(config_file.path(), None);
        let table = loader.load().expect("Failed to load test configuration");
        let chat_client =
            Arc::new(ChatClient::new(Duration::from_secs(2)).expect("Failed to build client"));
        let router = Arc::new(ChatRouter::new(table, chat_client, loader));
        let metrics = RelayMetrics::new().expect("Failed to create metrics");

        let state = Arc::new(AppState {
            router: router.clone(),
            metrics,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            axum::serve(listener, app(state))
                .await
                .expect("Server failed");
        });

        Self {
            base_url,
            chat,
            http_client: reqwest::Client::new(),
            router,
            config_file,
            server,
        }
    }

    /// Rewrite the configuration file and reload it
    pub fn rewrite_config(&self, secret: &str, projects_yaml: &str) {
        std::fs::write(
            self.config_file.path(),
            render_config(secret, projects_yaml, &self.chat.uri()),
        )
        .expect("Failed to write config file");
    }

    /// URL of the webhook receiver for the given secret
    pub fn webhook_url(&self, secret: &str) -> String {
        format!("{}/{}/jira", self.base_url, secret)
    }

    /// Send a Jira event to the webhook receiver
    pub async fn send_jira_event(&self, payload: &Value) -> reqwest::Response {
        self.http_client
            .post(self.webhook_url(SECRET))
            .json(payload)
            .send()
            .await
            .expect("Failed to send event")
    }

    /// Send a raw body to the webhook receiver
    pub async fn send_raw(&self, body: &'static str) -> reqwest::Response {
        self.http_client
            .post(self.webhook_url(SECRET))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to send event")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http_client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn metrics(&self) -> String {
        self.get("/metrics")
            .await
            .text()
            .await
            .expect("Failed to read metrics")
    }

    /// Number of requests the mock chat service has seen so far
    pub async fn chat_request_count(&self) -> usize {
        self.chat
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn render_config(secret: &str, projects_yaml: &str, chat_uri: &str) -> String {
    format!(
        "general:\n  secret: {}\n  ticket_url: {}\n  listen: \"127.0.0.1:0\"\n{}",
        secret,
        TICKET_URL,
        projects_yaml.replace("{chat}", chat_uri)
    )
}

/// Value of an unlabelled (or fully labelled) sample in exposition text
pub fn metric_value(text: &str, sample: &str) -> Option<f64> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (name, value) = line.rsplit_once(' ')?;
            (name == sample).then(|| value.parse().ok()).flatten()
        })
}
