//! Integration Tests for the cached API
//!
//! Drives a small meter API through the full router: cache middleware in
//! front of domain routes, admin endpoints under `/api/cache`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use meter_cache::{
    cache::StatsSnapshot, create_router, AppState, CacheBackend, CacheError, CachePolicy,
    CacheService, Config, UserId, WarmupSource,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

#[derive(Clone, Default)]
struct Meters {
    balances: Arc<Mutex<BTreeMap<String, i64>>>,
}

async fn list_meters(State(meters): State<Meters>) -> Json<Value> {
    let balances = meters.balances.lock().unwrap();
    let data: Vec<Value> = balances
        .iter()
        .map(|(id, balance)| json!({"id": id, "balance": balance}))
        .collect();
    Json(json!({"data": data}))
}

async fn show_meter(State(meters): State<Meters>, Path(id): Path<String>) -> Response {
    let balances = meters.balances.lock().unwrap();
    match balances.get(&id) {
        Some(balance) => Json(json!({"data": {"id": id, "balance": balance}})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Meter not found"}))).into_response(),
    }
}

async fn update_meter(
    State(meters): State<Meters>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let balance = body["balance"].as_i64().unwrap_or_default();
    meters.balances.lock().unwrap().insert(id.clone(), balance);
    Json(json!({"data": {"id": id, "balance": balance}}))
}

fn meter_routes(meters: Meters) -> Router {
    Router::new()
        .route("/api/meters", get(list_meters))
        .route("/api/meters/:id", get(show_meter).put(update_meter))
        .route(
            "/api/tariffs",
            get(|| async { Json(json!({"data": [{"name": "Domestic", "rate": 7500}]})) }),
        )
        .with_state(meters)
}

fn create_test_app() -> (Router, AppState, Meters) {
    let meters = Meters::default();
    meters.balances.lock().unwrap().insert("1".to_string(), 100);

    let state = AppState::from_config(&Config::default());
    let app = create_router(state.clone(), meter_routes(meters.clone()));
    (app, state, meters)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_to_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn x_cache(response: &Response) -> Option<&str> {
    response
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
}

// == Read-Through Flow ==

#[tokio::test]
async fn test_miss_hit_invalidate_cycle() {
    let (app, _, _) = create_test_app();

    let first = app.clone().oneshot(get_request("/api/meters")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), Some("MISS"));
    assert_eq!(first.headers()[header::CACHE_CONTROL], "private, max-age=300");
    assert!(first.headers().contains_key(header::EXPIRES));
    assert_eq!(first.headers()[header::VARY], "Authorization, Accept-Encoding");
    let first_body = body_bytes(first).await;

    let second = app.clone().oneshot(get_request("/api/meters")).await.unwrap();
    assert_eq!(x_cache(&second), Some("HIT"));
    assert_eq!(body_bytes(second).await, first_body);

    let detail = app.clone().oneshot(get_request("/api/meters/1")).await.unwrap();
    assert_eq!(x_cache(&detail), Some("MISS"));

    let put = app
        .clone()
        .oneshot(json_request("PUT", "/api/meters/1", r#"{"balance": 250}"#))
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::OK);
    assert!(put.headers().get("x-cache").is_none());
    assert!(put.headers().get(header::CACHE_CONTROL).is_none());

    let detail = app.clone().oneshot(get_request("/api/meters/1")).await.unwrap();
    assert_eq!(x_cache(&detail), Some("MISS"));
    assert_eq!(body_to_json(detail).await["data"]["balance"], 250);

    let list = app.clone().oneshot(get_request("/api/meters")).await.unwrap();
    assert_eq!(x_cache(&list), Some("MISS"));
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let (app, state, _) = create_test_app();

    let response = app.clone().oneshot(get_request("/api/meters/404")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-cache").is_none());

    assert!(!state.cache.has("api:meters:404").await.unwrap());
}

#[tokio::test]
async fn test_per_user_partitions() {
    let (_, state, meters) = create_test_app();

    for user in ["alice", "bob"] {
        let app = create_router(state.clone(), meter_routes(meters.clone()))
            .layer(Extension(UserId(user.to_string())));
        let response = app.oneshot(get_request("/api/meters")).await.unwrap();
        assert_eq!(x_cache(&response), Some("MISS"));

        let response = create_router(state.clone(), meter_routes(meters.clone()))
            .layer(Extension(UserId(user.to_string())))
            .oneshot(get_request("/api/tariffs"))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=3600");
    }

    assert!(state.cache.has("user:alice:api:meters").await.unwrap());
    assert!(state.cache.has("user:bob:api:meters").await.unwrap());
    assert!(state.cache.has("api:tariffs").await.unwrap());
    assert!(!state.cache.has("user:alice:api:tariffs").await.unwrap());
}

#[tokio::test]
async fn test_mutation_evicts_every_user_partition() {
    let (app, state, _) = create_test_app();
    state.cache.set("user:alice:api:meters", &json!({}), None).await.unwrap();
    state.cache.set("user:bob:api:meters:1", &json!({}), None).await.unwrap();
    state.cache.set("user:bob:api:properties", &json!({}), None).await.unwrap();
    state.cache.set("api:tariffs", &json!({}), None).await.unwrap();

    let response = app
        .oneshot(json_request("PUT", "/api/meters/1", r#"{"balance": 5}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!state.cache.has("user:alice:api:meters").await.unwrap());
    assert!(!state.cache.has("user:bob:api:meters:1").await.unwrap());
    assert!(!state.cache.has("user:bob:api:properties").await.unwrap());
    assert!(state.cache.has("api:tariffs").await.unwrap());
}

// == Admin Endpoints ==

#[tokio::test]
async fn test_stats_envelope() {
    let (app, _, _) = create_test_app();
    app.clone().oneshot(get_request("/api/meters")).await.unwrap();
    app.clone().oneshot(get_request("/api/meters")).await.unwrap();

    let response = app.oneshot(get_request("/api/cache/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["hits"], 1);
    assert_eq!(json["data"]["misses"], 1);
    assert_eq!(json["data"]["hit_ratio"], 50.0);
    assert_eq!(json["data"]["keys"], 1);
    assert!(json["data"]["memory_usage"].as_str().unwrap().ends_with(" B"));
    assert!(json["data"]["connections"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = create_test_app();
    app.clone().oneshot(get_request("/api/meters")).await.unwrap();
    for _ in 0..4 {
        app.clone().oneshot(get_request("/api/meters")).await.unwrap();
    }

    let response = app.oneshot(get_request("/api/cache/health")).await.unwrap();
    let json = body_to_json(response).await;
    let data = &json["data"];
    assert_eq!(data["status"], "healthy");
    assert_eq!(data["hit_ratio"], 80.0);
    assert_eq!(data["is_connected"], true);
    assert_eq!(data["threshold"], 50.0);
    assert_eq!(data["connections"], 1);
    assert!(data["memory_usage"].as_str().unwrap().ends_with(" B"));
    assert_eq!(data["warnings"], json!([]));
}

#[tokio::test]
async fn test_clear_pattern_endpoint() {
    let (app, state, _) = create_test_app();
    state.cache.set("api:meters", &json!([]), None).await.unwrap();
    state.cache.set("api:meters:1", &json!({}), None).await.unwrap();
    state.cache.set("api:tariffs", &json!([]), None).await.unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/cache/clear-pattern",
            r#"{"pattern": "api:meters*"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["message"], "Cache pattern cleared successfully");
    assert_eq!(json["data"], json!({"pattern": "api:meters*", "cleared_keys": 2}));
    assert!(state.cache.has("api:tariffs").await.unwrap());
}

#[tokio::test]
async fn test_clear_pattern_requires_pattern() {
    let (app, _, _) = create_test_app();

    for body in ["{}", r#"{"pattern": ""}"#, "not json"] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/cache/clear-pattern", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_to_json(response).await;
        assert_eq!(json, json!({"status": "error", "message": "Pattern is required"}));
    }
}

#[tokio::test]
async fn test_invalidate_endpoint() {
    let (app, state, _) = create_test_app();
    state.cache.set("api:meters", &json!([]), None).await.unwrap();
    state.cache.set("api:properties", &json!([]), None).await.unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/cache/invalidate",
            r#"{"operation": "meter_create"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["message"], "Cache invalidated successfully");
    assert_eq!(json["data"]["operation"], "meter_create");
    assert_eq!(json["data"]["patterns"], json!(["meters*", "properties*"]));
    assert_eq!(json["data"]["invalidated_keys"], 2);
}

#[tokio::test]
async fn test_invalidate_requires_operation() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(json_request("POST", "/api/cache/invalidate", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(response).await["message"], "Operation is required");
}

#[tokio::test]
async fn test_key_info_endpoint() {
    let (app, _, _) = create_test_app();
    app.clone().oneshot(get_request("/api/meters/1")).await.unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/cache/key/api:meters:1"))
        .await
        .unwrap();
    let json = body_to_json(response).await;
    assert_eq!(json["data"]["key"], "api:meters:1");
    assert_eq!(json["data"]["exists"], true);
    assert_eq!(json["data"]["ttl"], 300);
    assert!(json["data"]["size"].as_u64().unwrap() > 0);
    assert_eq!(json["data"]["value"]["data"]["balance"], 100);

    let response = app
        .oneshot(get_request("/api/cache/key/api:meters:999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(
        json["data"],
        json!({"key": "api:meters:999", "exists": false, "ttl": -2, "size": 0, "value": null})
    );
}

#[tokio::test]
async fn test_clear_endpoint() {
    let (app, state, _) = create_test_app();
    app.clone().oneshot(get_request("/api/meters")).await.unwrap();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/cache/clear", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response).await,
        json!({"status": "success", "message": "Cache cleared successfully"})
    );

    assert_eq!(state.cache.stats().await.unwrap().key_count, 0);
}

// == Warmup ==

struct FixtureSource;

#[async_trait]
impl WarmupSource for FixtureSource {
    async fn fetch(
        &self,
        route: &str,
        params: &BTreeMap<String, String>,
    ) -> meter_cache::Result<Value> {
        Ok(json!({"route": route, "limit": params.get("limit")}))
    }
}

#[tokio::test]
async fn test_warmup_endpoint_then_hit() {
    let state = AppState::from_config(&Config::default()).with_warmup_source(Arc::new(FixtureSource));
    let app = create_router(state.clone(), meter_routes(Meters::default()));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/cache/warmup", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["message"], "Cache warmed up successfully");
    assert_eq!(json["data"]["warmed_routes"], 6);

    let response = app
        .oneshot(get_request("/api/tariffs?offset=0&limit=50"))
        .await
        .unwrap();
    assert_eq!(x_cache(&response), Some("HIT"));
    assert_eq!(body_to_json(response).await["route"], "/api/tariffs");
}

// == Fail-Open ==

struct DownStore;

#[async_trait]
impl CacheBackend for DownStore {
    async fn get(&self, _key: &str) -> meter_cache::Result<Option<String>> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn set(&self, _key: &str, _value: String, _ttl: Option<u64>) -> meter_cache::Result<()> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn delete(&self, _key: &str) -> meter_cache::Result<bool> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn has(&self, _key: &str) -> meter_cache::Result<bool> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn ttl_remaining(&self, _key: &str) -> meter_cache::Result<i64> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn expire(&self, _key: &str, _ttl: u64) -> meter_cache::Result<bool> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn increment(&self, _key: &str, _by: i64) -> meter_cache::Result<i64> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn clear_by_pattern(&self, _pattern: &str) -> meter_cache::Result<usize> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn flush(&self) -> meter_cache::Result<()> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
    async fn stats(&self) -> meter_cache::Result<StatsSnapshot> {
        Err(CacheError::StoreUnavailable("redis down".into()))
    }
}

fn create_down_app() -> Router {
    let state = AppState::new(
        CacheService::from_backend(DownStore),
        Arc::new(CachePolicy::default()),
    );
    let meters = Meters::default();
    meters.balances.lock().unwrap().insert("1".to_string(), 100);
    create_router(state, meter_routes(meters))
}

#[tokio::test]
async fn test_unavailable_store_fails_open() {
    let app = create_down_app();

    let response = app.clone().oneshot(get_request("/api/meters/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-cache").is_none());
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert_eq!(body_to_json(response).await["data"]["balance"], 100);

    let response = app
        .oneshot(json_request("PUT", "/api/meters/1", r#"{"balance": 7}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unavailable_store_health_and_stats() {
    let app = create_down_app();

    let response = app.clone().oneshot(get_request("/api/cache/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["data"]["status"], "degraded");
    assert_eq!(json["data"]["hit_ratio"], 0.0);
    assert_eq!(json["data"]["is_connected"], false);
    assert_eq!(json["data"]["warnings"], json!(["Cache store unreachable"]));

    let response = app.oneshot(get_request("/api/cache/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_to_json(response).await["status"], "error");
}
