//! Meter Cache - policy-driven read-through HTTP response cache
//!
//! Caches JSON responses of a meter-management API with route-scoped TTLs,
//! per-user partitions and cascading invalidation, plus an admin plane.

pub mod admin;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod tasks;
pub mod upstream;

pub use admin::{CacheAdmin, WarmupSource};
pub use api::{create_router, AppState};
pub use cache::{CacheBackend, CacheService, MemoryStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use middleware::{cache_layer, identify_user, CacheLayerState, UserId};
pub use policy::CachePolicy;
pub use tasks::spawn_cleanup_task;
pub use upstream::UpstreamClient;
