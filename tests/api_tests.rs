mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use common::build_test_app;

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn post_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = build_test_app(None).await;

    let (status, json) = get_json(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["feed"], "ready");
    assert_eq!(json["buffer_len"], 2);
}

#[tokio::test]
async fn test_trades_are_deduplicated_and_sorted_by_value() {
    let app = build_test_app(None).await;

    let (status, json) = get_json(&app.router, "/api/trades?sort=value&dir=desc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let data = &json["data"];
    assert_eq!(data["status"], "ready");
    assert_eq!(data["total"], 2);
    assert_eq!(data["count"], 2);

    let trades = data["trades"].as_array().unwrap();
    assert_eq!(trades[0]["transaction_hash"], "0xwhale");
    assert_eq!(trades[1]["transaction_hash"], "0xshrimp");
    assert_eq!(trades[0]["display"]["value"], "$10,000");
    assert_eq!(trades[0]["display"]["action"], "Bought");
    assert_eq!(trades[0]["display"]["user"], "bigfish");
    assert_eq!(trades[1]["display"]["user"], "Small-Fry");
    assert_eq!(
        trades[0]["display"]["event_url"],
        "https://polymarket.com/event/fed-decision"
    );
}

#[tokio::test]
async fn test_trades_min_value_and_limit() {
    let app = build_test_app(None).await;

    let (_, json) = get_json(&app.router, "/api/trades?min_value=1000").await;
    let trades = json["data"]["trades"].as_array().unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0]["transaction_hash"], "0xwhale");

    let (_, json) = get_json(&app.router, "/api/trades?limit=1").await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["total"], 2);
}

#[tokio::test]
async fn test_trades_rejects_unknown_sort_key() {
    let app = build_test_app(None).await;

    let (status, json) = get_json(&app.router, "/api/trades?sort=size").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_set_filter_preset_resets_feed() {
    let app = build_test_app(None).await;
    let before = app.feed.snapshot().await;

    let (status, json) = post_json(
        &app.router,
        "/api/feed/filter",
        serde_json::json!({ "preset": "whale-5k" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["label"], "$5K+");
    assert_ne!(json["data"]["session_id"], serde_json::json!(before.session_id));

    common::wait_until_ready(&app.feed).await;
    let trades = app.feed.trades().await;
    assert_eq!(common::hashes(&trades), vec!["0xwhale"]);
}

#[tokio::test]
async fn test_set_filter_unknown_preset() {
    let app = build_test_app(None).await;

    let (status, _) = post_json(
        &app.router,
        "/api/feed/filter",
        serde_json::json!({ "preset": "whale-3k" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.feed.snapshot().await.label, "All");
}

#[tokio::test]
async fn test_retry_failure_keeps_buffer() {
    let app = build_test_app(None).await;
    let before = app.feed.trades().await;

    app.upstream.set_failing(true);
    let (status, json) = post_json(&app.router, "/api/feed/retry", serde_json::json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "failed");
    assert_eq!(json["data"]["error"], "API error: 503");
    assert_eq!(app.feed.trades().await, before);

    let (_, json) = get_json(&app.router, "/api/trades").await;
    assert_eq!(json["data"]["count"], 2);
    assert_eq!(json["data"]["last_error"], "API error: 503");

    let (_, json) = get_json(&app.router, "/health").await;
    assert_eq!(json["status"], "degraded");

    app.upstream.set_failing(false);
    let (_, json) = post_json(&app.router, "/api/feed/retry", serde_json::json!({})).await;
    assert_eq!(json["data"]["status"], "ready");
    assert_eq!(json["data"]["new_trades"], 0);
    assert!(json["data"]["error"].is_null());
}

#[tokio::test]
async fn test_feed_status_endpoint() {
    let app = build_test_app(None).await;

    let (status, json) = get_json(&app.router, "/api/feed/status").await;

    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["status"], "ready");
    assert_eq!(data["buffer_len"], 2);
    assert_eq!(data["buffer_cap"], 1000);
    assert_eq!(data["missing_hash"], "keep");
    assert_eq!(data["label"], "All");
}

#[tokio::test]
async fn test_events_are_normalized() {
    let app = build_test_app(None).await;

    let (status, json) = get_json(&app.router, "/api/events?filter=active").await;

    assert_eq!(status, StatusCode::OK);
    let events = json["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event["markets"][0]["outcomes"], serde_json::json!(["Yes", "No"]));
    assert_eq!(event["markets"][1]["outcome_prices"], serde_json::json!(["0.02", "0.98"]));
    assert_eq!(event["display"]["volume"], "$2.5M");
    assert_eq!(event["display"]["ends"], "2025-03-19");
    assert_eq!(event["display"]["markets"][0]["label"], "Cut");
    assert_eq!(event["display"]["markets"][0]["yes_price"], "66%");
    assert_eq!(event["display"]["markets"][1]["yes_price"], "2%");
}

#[tokio::test]
async fn test_events_closed_filter_and_upstream_failure() {
    let app = build_test_app(None).await;

    let (_, json) = get_json(&app.router, "/api/events?filter=closed").await;
    assert_eq!(json["data"], serde_json::json!([]));

    app.upstream.set_failing(true);
    let (status, json) = get_json(&app.router, "/api/events").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_proxy_passes_through_to_data_host() {
    let app = build_test_app(None).await;

    let (status, json) = get_json(&app.router, "/api/data/trades?limit=3").await;

    assert_eq!(status, StatusCode::OK);
    // raw upstream payload, duplicates included
    assert_eq!(json, common::upstream_trades());
}

#[tokio::test]
async fn test_proxy_passes_through_to_gamma_host() {
    let app = build_test_app(None).await;

    let (status, json) = get_json(&app.router, "/api/polymarket/events?closed=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_proxy_does_not_forward_query_token() {
    let app = build_test_app(Some("s3cret")).await;

    let (status, json) = get_json(&app.router, "/api/data/echo?limit=5&token=s3cret").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "limit=5");

    let (status, json) = get_json(&app.router, "/api/polymarket/echo?token=s3cret").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["query"].is_null());
}

#[tokio::test]
async fn test_auth_required_when_token_set() {
    let app = build_test_app(Some("secret")).await;

    let (status, _) = get_json(&app.router, "/api/trades").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_json(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/trades")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, _) = get_json(&app.router, "/api/feed/status?token=secret").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_json(&app.router, "/api/feed/status?token=wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = build_test_app(None).await;

    let resp = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let _text = String::from_utf8(body.to_vec()).unwrap();
    // Metric names may or may not appear depending on global recorder state
    // in tests (only one recorder per process).
}
