mod common;

use common::{BASE_URL, CACHE_TTL, TestApp};
use nanolink::api::dto::shorten::ShortenResponse;
use nanolink::api::dto::stats::StatsResponse;
use serde_json::json;
use tokio::sync::watch;

#[tokio::test]
async fn test_shorten_redirect_aggregate_stats() {
    let app = TestApp::new();
    let server = app.server();

    let created: ShortenResponse = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/page" }))
        .await
        .json();
    assert_eq!(created.short_code, "b");
    assert_eq!(created.short_url, format!("{BASE_URL}/b"));

    let redirect = server
        .get(&format!("/{}", created.short_code))
        .add_header("User-Agent", "TestBot/1.0")
        .await;
    assert_eq!(redirect.status_code(), 302);
    assert_eq!(redirect.header("location"), "https://example.com/page");

    app.stream.wait_for_entries(1).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(app.aggregator().run(vec!["clicks".to_string()], shutdown_rx));

    app.counters.wait_for_count(&created.short_code, 1).await;
    shutdown_tx.send(true).unwrap();
    worker.await.unwrap().unwrap();

    assert_eq!(app.stream.committed(), vec!["0-0"]);

    let stats: StatsResponse = server
        .get(&format!("/api/stats/{}", created.short_code))
        .await
        .json();
    assert_eq!(stats.short_code, "b");
    assert_eq!(stats.click_count, 1);
}

#[tokio::test]
async fn test_resolve_after_create_hits_cache() {
    let app = TestApp::new();
    let server = app.server();

    let created: ShortenResponse = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/cached" }))
        .await
        .json();

    assert_eq!(
        app.cache.get(&created.short_code).as_deref(),
        Some("https://example.com/cached")
    );
    assert_eq!(app.cache.ttl_of(&created.short_code), Some(CACHE_TTL));

    let response = server.get(&format!("/{}", created.short_code)).await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(app.links.find_calls(), 0);
}

#[tokio::test]
async fn test_expired_entry_falls_through_and_repopulates() {
    let app = TestApp::new();
    let server = app.server();

    let created: ShortenResponse = server
        .post("/shorten")
        .json(&json!({ "long_url": "https://example.com/expiring" }))
        .await
        .json();

    app.cache.expire(&created.short_code);

    let response = server.get(&format!("/{}", created.short_code)).await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/expiring");
    assert_eq!(app.links.find_calls(), 1);
    assert_eq!(
        app.cache.get(&created.short_code).as_deref(),
        Some("https://example.com/expiring")
    );

    server.get(&format!("/{}", created.short_code)).await;
    assert_eq!(app.links.find_calls(), 1);
}

#[tokio::test]
async fn test_unknown_code_is_404_and_not_cached() {
    let app = TestApp::new();
    let server = app.server();

    let response = server.get("/zzzz").await;

    assert_eq!(response.status_code(), 404);
    assert_eq!(app.cache.get("zzzz"), None);
    assert_eq!(app.stream.total(), 0);
}

#[tokio::test]
async fn test_replayed_clicks_each_count() {
    let app = TestApp::new();
    let server = app.server();

    let created: ShortenResponse = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/popular" }))
        .await
        .json();

    for _ in 0..3 {
        server.get(&format!("/{}", created.short_code)).await;
    }
    app.stream.wait_for_entries(3).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(app.aggregator().run(vec!["clicks".to_string()], shutdown_rx));

    app.counters.wait_for_count(&created.short_code, 3).await;
    shutdown_tx.send(true).unwrap();
    worker.await.unwrap().unwrap();

    assert_eq!(app.counters.count(&created.short_code), 3);
}

#[tokio::test]
async fn test_consecutive_links_get_consecutive_codes() {
    let app = TestApp::new();
    let server = app.server();

    let mut codes = Vec::new();
    for i in 0..63 {
        let created: ShortenResponse = server
            .post("/shorten")
            .json(&json!({ "long_url": format!("https://example.com/{i}") }))
            .await
            .json();
        codes.push(created.short_code);
    }

    assert_eq!(codes[0], "b");
    assert_eq!(codes[60], "9");
    assert_eq!(codes[61], "ba");
    assert_eq!(codes[62], "bb");
    assert_eq!(app.links.len(), 63);
}
