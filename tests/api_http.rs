// tests/api_http.rs
//
// HTTP-level tests for the read-only Router without opening sockets.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use sentiment_topwords::aggregate::{RankedWord, TopK, WindowSpec};
use sentiment_topwords::api::{self, AppState};
use sentiment_topwords::sink::LatestSink;
use sentiment_topwords::{Sentiment, Sink};

const BODY_LIMIT: usize = 1024 * 1024;

async fn test_router() -> Router {
    let latest = Arc::new(LatestSink::new());
    let at = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 30).unwrap();
    let top = TopK {
        window: WindowSpec::default().assign(Sentiment::Positive, at),
        entries: vec![RankedWord {
            word: "love".into(),
            count: 2,
        }],
    };
    latest.publish(Sentiment::Positive, &top).await.unwrap();
    api::router(AppState { latest }, None)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, body) = get(test_router().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn top_for_published_sentiment() {
    let (status, body) = get(test_router().await, "/top/positive").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["entries"][0]["word"], "love");
    assert_eq!(v["entries"][0]["count"], 2);
    assert_eq!(v["window"]["sentiment"], "positive");
}

#[tokio::test]
async fn top_errors_for_unknown_or_silent_sentiment() {
    let (status, _) = get(test_router().await, "/top/angry").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(test_router().await, "/top/neutral").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn top_all_is_keyed_by_sentiment() {
    let (status, body) = get(test_router().await, "/top").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).unwrap();
    assert!(v.get("positive").is_some());
    assert!(v.get("negative").is_none());
}
