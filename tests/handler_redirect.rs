mod common;

use common::TestApp;
use nanolink::domain::click_event::ClickEvent;
use serde_json::json;

#[tokio::test]
async fn test_redirect_success_emits_click() {
    let app = TestApp::new();
    let server = app.server();
    server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/target" }))
        .await;

    let response = server
        .get("/b")
        .add_header("User-Agent", "Mozilla/5.0")
        .await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/target");

    app.stream.wait_for_entries(1).await;
    let event = ClickEvent::from_payload(&app.stream.entries("clicks")[0]).unwrap();
    assert_eq!(event.short_code, "b");
    assert_eq!(event.user_agent, "Mozilla/5.0");
    assert!(event.timestamp > 0);
}

#[tokio::test]
async fn test_redirect_not_found() {
    let app = TestApp::new();
    let server = app.server();

    let response = server.get("/nonexistent").await;

    assert_eq!(response.status_code(), 404);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_invalid_token() {
    let app = TestApp::new();
    let server = app.server();

    let response = server.get("/bad-code").await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_token");
    assert_eq!(app.links.find_calls(), 0);
}

#[tokio::test]
async fn test_redirect_without_emitter() {
    let app = TestApp::with_emitter(false);
    let server = app.server();
    server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com" }))
        .await;

    let response = server.get("/b").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(app.stream.total(), 0);
}

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new();
    let server = app.server();

    let response = server.get("/").await;

    response.assert_status_ok();
    response.assert_text("NanoLink URL shortener is running");
}
