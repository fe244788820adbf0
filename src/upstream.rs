//! Upstream forwarder.
//!
//! Forwards requests the cache does not answer to the upstream CRUD service,
//! and fetches warmup payloads from it.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    response::Response,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::admin::WarmupSource;
use crate::error::{CacheError, Result};

/// Largest request body forwarded upstream.
const MAX_FORWARD_BODY: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CacheError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute upstream URL for a path (with optional query).
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Replays `request` against the upstream and converts the answer back.
    #[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
    pub async fn forward(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = self.url_for(
            request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/"),
        );
        let headers = forwardable(request.headers());

        let body = axum::body::to_bytes(request.into_body(), MAX_FORWARD_BODY)
            .await
            .map_err(|e| CacheError::InvalidRequest(format!("failed to read request body: {}", e)))?;

        let upstream = self
            .http
            .request(method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(upstream_error)?;

        let status = upstream.status();
        debug!(%status, url, "upstream answered");

        let mut builder = Response::builder().status(status);
        for (name, value) in upstream.headers() {
            if !is_hop_by_hop_header(name.as_str()) {
                builder = builder.header(name, value);
            }
        }

        let bytes = upstream.bytes().await.map_err(upstream_error)?;
        builder
            .body(Body::from(bytes))
            .map_err(|e| CacheError::Internal(format!("failed to build response: {}", e)))
    }
}

/// Fallback handler: every request without a local route goes upstream.
pub async fn proxy_handler(
    State(upstream): State<UpstreamClient>,
    request: Request,
) -> Result<Response> {
    upstream.forward(request).await
}

#[async_trait]
impl WarmupSource for UpstreamClient {
    async fn fetch(&self, route: &str, params: &BTreeMap<String, String>) -> Result<Value> {
        let response = self
            .http
            .get(self.url_for(route))
            .query(params)
            .send()
            .await
            .map_err(upstream_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Upstream(format!(
                "{} answered {}",
                route, status
            )));
        }

        response.json::<Value>().await.map_err(upstream_error)
    }
}

fn upstream_error(e: reqwest::Error) -> CacheError {
    if e.is_timeout() {
        CacheError::Upstream(format!("request timed out: {}", e))
    } else if e.is_connect() {
        CacheError::Upstream(format!("failed to connect: {}", e))
    } else {
        CacheError::Upstream(e.to_string())
    }
}

/// Request headers sent upstream. `accept-encoding` is dropped so bodies come
/// back uncompressed and can be decoded for caching.
fn forwardable(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop_header(name.as_str()))
        .filter(|(name, _)| **name != header::ACCEPT_ENCODING)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// RFC 2616 §13.5.1 hop-by-hop headers, plus `host` and `content-length`
/// which are recomputed for the upstream request.
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}
