//! Response cache headers

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};

use super::Visibility;

/// `X-Cache` response header.
pub const X_CACHE: &str = "x-cache";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Headers attached to every cache-carrying response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub cache_control: String,
    pub expires: String,
    pub vary: &'static str,
}

impl CacheHeaders {
    pub fn build(visibility: Visibility, ttl_seconds: u64, now: DateTime<Utc>) -> Self {
        let expires_at = now + Duration::seconds(ttl_seconds as i64);
        let (scope, vary) = match visibility {
            Visibility::Public => ("public", "Accept-Encoding"),
            Visibility::Private => ("private", "Authorization, Accept-Encoding"),
        };

        Self {
            cache_control: format!("{}, max-age={}", scope, ttl_seconds),
            expires: expires_at.format(HTTP_DATE_FORMAT).to_string(),
            vary,
        }
    }

    /// Writes the headers plus `X-Cache: {status}` into `headers`.
    pub fn apply(&self, headers: &mut HeaderMap, status: &'static str) {
        if let Ok(value) = HeaderValue::from_str(&self.cache_control) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.expires) {
            headers.insert(header::EXPIRES, value);
        }
        headers.insert(header::VARY, HeaderValue::from_static(self.vary));
        headers.insert(X_CACHE, HeaderValue::from_static(status));
    }
}
