//! API Handlers
//!
//! HTTP handlers for the cache admin endpoints under `/api/cache`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::de::DeserializeOwned;

use crate::admin::CacheAdmin;
use crate::cache::StatsSnapshot;
use crate::error::Result;
use crate::models::{
    ApiResponse, ClearPatternData, ClearPatternRequest, HealthReport, InvalidateData,
    InvalidateRequest, KeyInfo, WarmupData,
};

/// Decodes a JSON body; an empty or malformed body yields the default request.
fn body_or_default<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

/// Handler for GET /api/cache/stats
pub async fn stats_handler(
    State(admin): State<CacheAdmin>,
) -> Result<Json<ApiResponse<StatsSnapshot>>> {
    let stats = admin.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Handler for GET /api/cache/health
///
/// Always `200`; a store that cannot be reached shows up in the payload.
pub async fn health_handler(State(admin): State<CacheAdmin>) -> Json<ApiResponse<HealthReport>> {
    Json(ApiResponse::success(admin.health().await))
}

/// Handler for POST /api/cache/clear
pub async fn clear_handler(State(admin): State<CacheAdmin>) -> Result<Json<ApiResponse>> {
    admin.clear().await?;
    Ok(Json(ApiResponse::message("Cache cleared successfully")))
}

/// Handler for POST /api/cache/clear-pattern
pub async fn clear_pattern_handler(
    State(admin): State<CacheAdmin>,
    body: Bytes,
) -> Result<Json<ApiResponse<ClearPatternData>>> {
    let req: ClearPatternRequest = body_or_default(&body);
    let data = admin.clear_pattern(req.required()).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Cache pattern cleared successfully",
        data,
    )))
}

/// Handler for POST /api/cache/warmup
pub async fn warmup_handler(
    State(admin): State<CacheAdmin>,
) -> Result<Json<ApiResponse<WarmupData>>> {
    let warmed_routes = admin.warmup().await?;
    Ok(Json(ApiResponse::success_with_message(
        "Cache warmed up successfully",
        WarmupData { warmed_routes },
    )))
}

/// Handler for POST /api/cache/invalidate
pub async fn invalidate_handler(
    State(admin): State<CacheAdmin>,
    body: Bytes,
) -> Result<Json<ApiResponse<InvalidateData>>> {
    let req: InvalidateRequest = body_or_default(&body);
    let data = admin.invalidate(req.required()).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Cache invalidated successfully",
        data,
    )))
}

/// Handler for GET /api/cache/key/:key
pub async fn key_handler(
    State(admin): State<CacheAdmin>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<KeyInfo>>> {
    let info = admin.key_info(&key).await?;
    Ok(Json(ApiResponse::success(info)))
}
