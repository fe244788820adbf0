//! Policy Engine
//!
//! Static, route-aware caching rules: TTL, cacheability, visibility, key
//! composition, invalidation patterns, response headers and warmup routes.
//! Built once at startup and shared behind an `Arc`; every method is pure.

mod headers;
mod invalidation;
mod key;
mod route;
mod warmup;

pub use headers::{CacheHeaders, X_CACHE};
pub use invalidation::InvalidationRule;
pub use key::{canonical_query, key_for, scoped_patterns, KEY_NAMESPACE};
pub use route::RouteShape;
pub use warmup::WarmupRoute;

use axum::http::Method;
use chrono::{DateTime, Utc};

// == Constants ==
/// TTL for routes without a rule.
pub const DEFAULT_TTL: u64 = 300;
/// Hit-ratio percentage at or above which the cache reports `healthy`.
pub const DEFAULT_HEALTH_THRESHOLD: f64 = 50.0;
/// Connected clients above which health carries a warning.
pub const DEFAULT_CONNECTION_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

// == Route Rule ==
/// A known route. Rules with `cacheable: false` still drive TTL and headers
/// but their responses are never stored.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub shape: RouteShape,
    pub ttl_seconds: u64,
    pub cacheable: bool,
    pub visibility: Visibility,
}

impl RouteRule {
    fn new(template: &str, ttl_seconds: u64, visibility: Visibility) -> Self {
        Self {
            shape: RouteShape::parse(template),
            ttl_seconds,
            cacheable: true,
            visibility,
        }
    }

    fn uncached(template: &str, ttl_seconds: u64, visibility: Visibility) -> Self {
        Self {
            cacheable: false,
            ..Self::new(template, ttl_seconds, visibility)
        }
    }
}

// == Cache Policy ==
#[derive(Debug, Clone)]
pub struct CachePolicy {
    routes: Vec<RouteRule>,
    /// Prefix shapes: a path at or below any of these is never cached.
    exclusions: Vec<RouteShape>,
    invalidation: Vec<InvalidationRule>,
    warmup: Vec<WarmupRoute>,
    default_ttl: u64,
    health_threshold: f64,
    connection_limit: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_HEALTH_THRESHOLD)
    }
}

impl CachePolicy {
    /// Standard rule tables with the given fallback TTL and health threshold.
    pub fn new(default_ttl: u64, health_threshold: f64) -> Self {
        Self {
            routes: default_routes(),
            exclusions: default_exclusions(),
            invalidation: invalidation::default_rules(),
            warmup: warmup::default_routes(),
            default_ttl,
            health_threshold,
            connection_limit: DEFAULT_CONNECTION_LIMIT,
        }
    }

    pub fn with_connection_limit(mut self, connection_limit: usize) -> Self {
        self.connection_limit = connection_limit;
        self
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn health_threshold(&self) -> f64 {
        self.health_threshold
    }

    pub fn connection_limit(&self) -> usize {
        self.connection_limit
    }

    pub fn routes(&self) -> &[RouteRule] {
        &self.routes
    }

    /// Most specific rule whose shape matches `path`.
    pub fn rule_for(&self, path: &str) -> Option<&RouteRule> {
        self.routes
            .iter()
            .filter(|rule| rule.shape.matches(path))
            .max_by_key(|rule| rule.shape.specificity())
    }

    // == TTL & Cacheability ==
    pub fn ttl_for(&self, path: &str) -> u64 {
        self.rule_for(path)
            .map(|rule| rule.ttl_seconds)
            .unwrap_or(self.default_ttl)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.iter().any(|shape| shape.matches_prefix(path))
    }

    /// `GET` on a known cacheable route that is not excluded.
    pub fn is_cacheable(&self, method: &Method, path: &str) -> bool {
        if method != Method::GET || self.is_excluded(path) {
            return false;
        }
        self.rule_for(path).is_some_and(|rule| rule.cacheable)
    }

    /// Unknown routes are private.
    pub fn visibility(&self, path: &str) -> Visibility {
        self.rule_for(path)
            .map(|rule| rule.visibility)
            .unwrap_or(Visibility::Private)
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.visibility(path) == Visibility::Public
    }

    // == Keys ==
    /// Cache key for a request. The user partition is dropped on public routes.
    pub fn key_for<I, K, V>(&self, path: &str, query: I, user_id: Option<&str>) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let user_id = if self.is_public(path) { None } else { user_id };
        key_for(path, query, user_id)
    }

    // == Invalidation ==
    /// Resource-relative patterns for a mutated route (`/api/...`) or a named
    /// operation (`meter_update`). Unknown targets yield nothing.
    pub fn invalidation_patterns_for(&self, target: &str) -> Vec<String> {
        if target.starts_with('/') {
            invalidation::patterns_for_path(&self.invalidation, target)
        } else {
            invalidation::patterns_for_operation(&self.invalidation, target)
        }
    }

    /// Key-space globs evicted for `target`.
    pub fn eviction_patterns_for(&self, target: &str) -> Vec<String> {
        self.invalidation_patterns_for(target)
            .iter()
            .flat_map(|pattern| scoped_patterns(pattern))
            .collect()
    }

    // == Headers ==
    pub fn headers_for(&self, path: &str, ttl_seconds: u64) -> CacheHeaders {
        self.headers_for_at(path, ttl_seconds, Utc::now())
    }

    pub fn headers_for_at(&self, path: &str, ttl_seconds: u64, now: DateTime<Utc>) -> CacheHeaders {
        CacheHeaders::build(self.visibility(path), ttl_seconds, now)
    }

    // == Warmup ==
    pub fn warmup_routes(&self) -> &[WarmupRoute] {
        &self.warmup
    }
}

fn default_routes() -> Vec<RouteRule> {
    use Visibility::{Private, Public};

    vec![
        RouteRule::new("/api/meters", 300, Private),
        RouteRule::new("/api/meters/{id}", 300, Private),
        RouteRule::new("/api/meters/{id}/balance", 60, Private),
        RouteRule::new("/api/meters/{id}/status", 30, Private),
        RouteRule::new("/api/meters/{id}/credits", 300, Private),
        RouteRule::new("/api/meters/{id}/consumption", 600, Private),
        RouteRule::new("/api/tariffs", 3600, Public),
        RouteRule::new("/api/tariffs/{id}", 3600, Public),
        RouteRule::new("/api/service-fees", 3600, Public),
        RouteRule::new("/api/service-fees/{id}", 3600, Public),
        RouteRule::new("/api/properties", 1800, Private),
        RouteRule::new("/api/properties/{id}", 1800, Private),
        // The user directory changes with every sign-up; only profiles are stored.
        RouteRule::uncached("/api/users", 900, Private),
        RouteRule::new("/api/users/{id}", 900, Private),
        RouteRule::new("/api/payments", 300, Private),
        RouteRule::new("/api/payments/{id}", 300, Private),
    ]
}

fn default_exclusions() -> Vec<RouteShape> {
    [
        "/api/auth",
        "/api/meters/{id}/ota",
        "/api/meters/{id}/control",
        "/api/meters/{id}/valve",
        "/api/realtime",
        "/api/cache",
    ]
    .into_iter()
    .map(RouteShape::parse)
    .collect()
}
