//! API Module
//!
//! HTTP surface of the cache: the admin endpoints and router assembly.
//!
//! # Endpoints (under `/api/cache`)
//! - `GET /stats` - Store statistics
//! - `GET /health` - Hit-ratio health report
//! - `POST /clear` - Flush every entry
//! - `POST /clear-pattern` - Delete keys matching a glob
//! - `POST /warmup` - Pre-populate high-traffic routes
//! - `POST /invalidate` - Evict what a mutation would evict
//! - `GET /key/:key` - Inspect a single key

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{admin_router, create_router, AppState, ADMIN_PREFIX};
