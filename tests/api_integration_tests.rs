//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use callcache::api::{create_router, AppState};
use callcache::fetch::{ExpiringFetchCache, FetchError, FnFetcher};
use callcache::store::{MemoryStore, SharedStore};
use callcache::InstrumentedCache;
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

async fn create_test_app() -> (Router, Arc<AtomicUsize>) {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let cache = InstrumentedCache::new(store.clone()).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let pages = ExpiringFetchCache::new(
        store,
        FnFetcher(move |resource: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>(format!("<p>{}</p>", resource))
            }
        }),
    );

    (create_router(AppState::new(cache, pages, "memory")), calls)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn put_store(body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/store")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// == STORE / GET Endpoint Tests ==

#[tokio::test]
async fn test_store_then_get() {
    let (app, _) = create_test_app().await;

    let (status, json) = send(&app, put_store(r#"{"value":"hello"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let key = json["key"].as_str().unwrap().to_string();
    assert_eq!(key.len(), 36);

    let (status, json) = send(&app, get(&format!("/get/{}", key))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"].as_str().unwrap(), key);
    assert_eq!(json["value"].as_str().unwrap(), "hello");

    let (_, json) = send(&app, get(&format!("/get/{}?as=text", key))).await;
    assert_eq!(json["value"].as_str().unwrap(), "hello");
}

#[tokio::test]
async fn test_store_integer_and_decode() {
    let (app, _) = create_test_app().await;

    let (status, json) = send(&app, put_store(r#"{"value":"1024","kind":"integer"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let key = json["key"].as_str().unwrap().to_string();

    let (status, json) = send(&app, get(&format!("/get/{}?as=integer", key))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"].as_i64().unwrap(), 1024);
}

#[tokio::test]
async fn test_store_invalid_value() {
    let (app, _) = create_test_app().await;

    let (status, json) = send(&app, put_store(r#"{"value":"1.5.6","kind":"float"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_store_non_finite_float_rejected() {
    let (app, _) = create_test_app().await;

    let (status, _) = send(&app, put_store(r#"{"value":"NaN","kind":"float"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&app, get("/calls/store")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"].as_u64().unwrap(), 0);
}

#[tokio::test]
async fn test_store_unknown_kind_rejected() {
    let (app, _) = create_test_app().await;

    let response = app
        .oneshot(put_store(r#"{"value":"x","kind":"boolean"}"#))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_get_absent_key_is_null() {
    let (app, _) = create_test_app().await;

    let (status, json) = send(&app, get("/get/nonexistent_key")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["value"].is_null());
}

#[tokio::test]
async fn test_get_wrong_kind_is_unprocessable() {
    let (app, _) = create_test_app().await;

    let (_, json) = send(&app, put_store(r#"{"value":"abc"}"#)).await;
    let key = json["key"].as_str().unwrap().to_string();

    let (status, _) = send(&app, get(&format!("/get/{}?as=integer", key))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// == REPLAY / CALLS Endpoint Tests ==

#[tokio::test]
async fn test_replay_and_calls() {
    let (app, _) = create_test_app().await;

    let mut keys = Vec::new();
    for value in ["foo", "bar", "baz"] {
        let (_, json) = send(&app, put_store(&format!(r#"{{"value":"{}"}}"#, value))).await;
        keys.push(json["key"].as_str().unwrap().to_string());
    }

    let (status, json) = send(&app, get("/calls/store")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"].as_u64().unwrap(), 3);

    let (status, json) = send(&app, get("/replay/store")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["calls"].as_u64().unwrap(), 3);

    let lines: Vec<&str> = json["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line.as_str().unwrap())
        .collect();
    assert_eq!(lines[0], "store was called 3 times:");
    assert_eq!(lines[1], format!("store(\"foo\") -> {}", keys[0]));
    assert_eq!(lines[3], format!("store(\"baz\") -> {}", keys[2]));
}

#[tokio::test]
async fn test_replay_unknown_operation() {
    let (app, _) = create_test_app().await;

    let (status, json) = send(&app, get("/replay/never_called")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["calls"].as_u64().unwrap(), 0);
}

// == FETCH Endpoint Tests ==

#[tokio::test]
async fn test_fetch_cached_and_counted() {
    let (app, calls) = create_test_app().await;

    for _ in 0..3 {
        let (status, json) = send(&app, get("/fetch?resource=http://example.com/page")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["body"].as_str().unwrap(), "<p>http://example.com/page</p>");
    }

    let (status, json) = send(&app, get("/fetch/count?resource=http://example.com/page")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"].as_u64().unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetch_missing_resource_param() {
    let (app, _) = create_test_app().await;

    let response = app.oneshot(get("/fetch")).await.unwrap();
    assert!(response.status().is_client_error());
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app().await;

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert_eq!(json["store"].as_str().unwrap(), "memory");
    assert!(json.get("timestamp").is_some());
}
