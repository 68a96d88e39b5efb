//! Integration tests for the non-webhook endpoints and secret handling

use crate::common::{TestEnvironment, create_jira_issue_created_payload, metric_value};
use reqwest::StatusCode;
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

const PROJECTS: &str = "projects:\n  abc:\n    - webhook: \"{chat}/hook\"\n";

#[tokio::test]
async fn test_root_returns_welcome_line() {
    let env = TestEnvironment::start(PROJECTS).await;

    let response = env.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.text().await.unwrap(),
        "Welcome to the JIRA webhook to chat bridge\n"
    );
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let env = TestEnvironment::start(PROJECTS).await;

    let response = env.get("/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_healthz_returns_ok() {
    let env = TestEnvironment::start(PROJECTS).await;

    let response = env.get("/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_metrics_start_at_zero() {
    let env = TestEnvironment::start(PROJECTS).await;

    let response = env.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = response.text().await.unwrap();
    assert_eq!(metric_value(&text, "jira_webhooks_processed_total"), Some(0.0));
    assert_eq!(
        metric_value(&text, "jira_unknown_webhooks_received_total"),
        Some(0.0)
    );
}

#[tokio::test]
async fn test_wrong_secret_is_not_found_and_not_dispatched() {
    let env = TestEnvironment::start(PROJECTS).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&env.chat)
        .await;

    let payload = create_jira_issue_created_payload("ABC", "ABC-1", "Fix bug", "Alice");
    let response = env
        .http_client
        .post(env.webhook_url("wrong"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        metric_value(&env.metrics().await, "jira_webhooks_processed_total"),
        Some(0.0)
    );
}

#[tokio::test]
async fn test_webhook_path_rejects_get() {
    let env = TestEnvironment::start(PROJECTS).await;

    let response = env.get(&format!("/{}/jira", crate::common::SECRET)).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_reloaded_secret_takes_effect() {
    let env = TestEnvironment::start(PROJECTS).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&env.chat)
        .await;

    env.rewrite_config("rotated", PROJECTS);
    env.router.reload().expect("Reload failed");

    let payload = create_jira_issue_created_payload("ABC", "ABC-1", "Fix bug", "Alice");

    let old = env
        .http_client
        .post(env.webhook_url(crate::common::SECRET))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::NOT_FOUND);

    let new = env
        .http_client
        .post(env.webhook_url("rotated"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_broken_reload_keeps_serving_previous_config() {
    let env = TestEnvironment::start(PROJECTS).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&env.chat)
        .await;

    // No secret anywhere: the reload must be rejected
    env.rewrite_config("", PROJECTS);
    assert!(env.router.reload().is_err());

    let payload = create_jira_issue_created_payload("ABC", "ABC-1", "Fix bug", "Alice");
    let response = env.send_jira_event(&payload).await;

    assert_eq!(response.status(), StatusCode::OK);
}
