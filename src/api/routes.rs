//! API Routes
//!
//! Assembles the admin router and wraps application routes with the cache
//! middleware.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, clear_pattern_handler, health_handler, invalidate_handler, key_handler,
    stats_handler, warmup_handler,
};
use crate::admin::{CacheAdmin, WarmupSource};
use crate::cache::{CacheService, MemoryStore};
use crate::config::Config;
use crate::middleware::{cache_layer, identify_user, CacheLayerState};
use crate::policy::CachePolicy;

/// Prefix the admin router is mounted under.
pub const ADMIN_PREFIX: &str = "/api/cache";

/// Shared cache handles used to build the router.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheService,
    pub policy: Arc<CachePolicy>,
    pub warmup_source: Option<Arc<dyn WarmupSource>>,
}

impl AppState {
    pub fn new(cache: CacheService, policy: Arc<CachePolicy>) -> Self {
        Self {
            cache,
            policy,
            warmup_source: None,
        }
    }

    /// In-memory store and standard policy sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheService::from_backend(MemoryStore::new(config.max_entries));
        let policy = CachePolicy::new(config.default_ttl, config.health_threshold)
            .with_connection_limit(config.connection_limit);
        Self::new(cache, Arc::new(policy))
    }

    pub fn with_warmup_source(mut self, source: Arc<dyn WarmupSource>) -> Self {
        self.warmup_source = Some(source);
        self
    }

    pub fn admin(&self) -> CacheAdmin {
        let admin = CacheAdmin::new(self.cache.clone(), self.policy.clone());
        match &self.warmup_source {
            Some(source) => admin.with_warmup_source(source.clone()),
            None => admin,
        }
    }

    pub fn layer_state(&self) -> CacheLayerState {
        CacheLayerState::new(self.cache.clone(), self.policy.clone())
    }
}

/// Admin endpoints, relative to [`ADMIN_PREFIX`].
///
/// - `GET /stats`, `GET /health`, `GET /key/:key`
/// - `POST /clear`, `POST /clear-pattern`, `POST /warmup`, `POST /invalidate`
pub fn admin_router(admin: CacheAdmin) -> Router {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/clear", post(clear_handler))
        .route("/clear-pattern", post(clear_pattern_handler))
        .route("/warmup", post(warmup_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/key/:key", get(key_handler))
        .with_state(admin)
}

/// Full application router: admin endpoints plus `app_routes`, all behind the
/// cache middleware, CORS and request tracing.
///
/// Callers are identified from their `Authorization` header before the cache
/// sees the request, so private responses land in per-user slots.
pub fn create_router(state: AppState, app_routes: Router) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest(ADMIN_PREFIX, admin_router(state.admin()))
        .merge(app_routes)
        .layer(middleware::from_fn_with_state(
            state.layer_state(),
            cache_layer,
        ))
        .layer(middleware::from_fn(identify_user))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
