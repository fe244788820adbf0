//! Cache Module
//!
//! The Cache Store capability: a TTL-aware key/value contract, its in-memory
//! implementation, and the JSON-typed service the rest of the crate uses.

mod backend;
mod entry;
mod glob;
mod lru;
mod memory;
mod service;
mod stats;
mod store;


// Re-export public types
pub use backend::CacheBackend;
pub use entry::{CacheEntry, TTL_MISSING, TTL_PERSISTENT};
pub use glob::KeyPattern;
pub use lru::LruTracker;
pub use memory::MemoryStore;
pub use service::CacheService;
pub use stats::{format_bytes, hit_ratio, CacheStats, StatsSnapshot};
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
