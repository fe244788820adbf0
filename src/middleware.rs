//! Response cache middleware.
//!
//! Read-through caching for cacheable `GET` routes and pattern eviction after
//! successful mutations. Store failures never fail a request.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::{stream, StreamExt};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheService, MAX_VALUE_SIZE};
use crate::policy::{CacheHeaders, CachePolicy};

/// Identity the cache partitions private responses by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    /// Fingerprint of an `Authorization` credential: the first 16 bytes of its
    /// SHA-256, hex encoded. Blank credentials carry no identity.
    pub fn from_credential(credential: &str) -> Option<Self> {
        let credential = credential.trim();
        if credential.is_empty() {
            return None;
        }

        let digest = Sha256::digest(credential.as_bytes());
        Some(Self(hex::encode(&digest[..16])))
    }
}

/// Attaches a [`UserId`] derived from the `Authorization` header unless an
/// outer layer already set one. Runs in front of [`cache_layer`].
pub async fn identify_user(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<UserId>().is_none() {
        let user = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(UserId::from_credential);
        if let Some(user) = user {
            request.extensions_mut().insert(user);
        }
    }
    next.run(request).await
}

/// Shared state for [`cache_layer`].
#[derive(Clone)]
pub struct CacheLayerState {
    pub cache: CacheService,
    pub policy: Arc<CachePolicy>,
}

impl CacheLayerState {
    pub fn new(cache: CacheService, policy: Arc<CachePolicy>) -> Self {
        Self { cache, policy }
    }
}

fn is_mutation(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn cache_layer(
    State(state): State<CacheLayerState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if is_mutation(&method) {
        let response = next.run(request).await;
        if response.status().is_success() {
            invalidate(&state, &path).await;
        }
        return response;
    }

    if !state.policy.is_cacheable(&method, &path) {
        return next.run(request).await;
    }

    let user_id = request.extensions().get::<UserId>().map(|u| u.0.clone());
    if user_id.is_none()
        && !state.policy.is_public(&path)
        && request.headers().contains_key(header::AUTHORIZATION)
    {
        debug!("credentialed request without identity, not caching");
        return next.run(request).await;
    }

    let query: Vec<(String, String)> = Query::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();

    let key = state.policy.key_for(
        &path,
        query.iter().map(|(name, value)| (name, value)),
        user_id.as_deref(),
    );
    let ttl = state.policy.ttl_for(&path);
    let headers = state.policy.headers_for(&path, ttl);

    match state.cache.get::<Value>(&key).await {
        Ok(Some(payload)) => {
            debug!(key, outcome = "hit", "serving cached response");
            return json_response(StatusCode::OK, &payload, &headers, "HIT");
        }
        Ok(None) => debug!(key, outcome = "miss", "cache miss, executing handler"),
        Err(e) => {
            warn!(key, error = %e, "cache lookup failed, bypassing cache");
            return next.run(request).await;
        }
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match buffer_body(body, MAX_VALUE_SIZE).await {
        BufferedBody::Complete(bytes) => bytes,
        BufferedBody::Passthrough(body) => {
            debug!(key, "response body too large or unreadable, not caching");
            return Response::from_parts(parts, body);
        }
    };

    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => {
            debug!(key, error = %e, "response body is not JSON, not caching");
            return Response::from_parts(parts, Body::from(bytes));
        }
    };

    if let Err(e) = state.cache.set(&key, &payload, Some(ttl)).await {
        warn!(key, error = %e, "failed to store response");
    }

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.apply(&mut parts.headers, "MISS");
    Response::from_parts(parts, Body::from(payload.to_string()))
}

enum BufferedBody {
    Complete(Bytes),
    /// Chunks read so far replayed ahead of the unread remainder.
    Passthrough(Body),
}

/// Buffers at most `limit` bytes. A larger body, or one that fails mid-read,
/// is handed back intact for the client to receive as the handler sent it.
async fn buffer_body(body: Body, limit: usize) -> BufferedBody {
    let mut rest = body.into_data_stream();
    let mut chunks = Vec::new();
    let mut size = 0;

    while let Some(chunk) = rest.next().await {
        let stop = match &chunk {
            Ok(bytes) => {
                size += bytes.len();
                size > limit
            }
            Err(_) => true,
        };
        chunks.push(chunk);

        if stop {
            let replay = stream::iter(chunks).chain(rest);
            return BufferedBody::Passthrough(Body::from_stream(replay));
        }
    }

    let mut buffer = Vec::with_capacity(size);
    for bytes in chunks.into_iter().flatten() {
        buffer.extend_from_slice(&bytes);
    }
    BufferedBody::Complete(Bytes::from(buffer))
}

async fn invalidate(state: &CacheLayerState, path: &str) {
    let patterns = state.policy.eviction_patterns_for(path);
    if patterns.is_empty() {
        return;
    }

    match state.cache.clear_patterns(&patterns).await {
        Ok(cleared) => info!(path, cleared, "invalidated cached responses"),
        Err(e) => warn!(path, error = %e, "cache invalidation failed"),
    }
}

fn json_response(
    status: StatusCode,
    payload: &Value,
    headers: &CacheHeaders,
    outcome: &'static str,
) -> Response {
    let mut response = (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        payload.to_string(),
    )
        .into_response();
    headers.apply(response.headers_mut(), outcome);
    response
}
