//! Cache key composition
//!
//! Keys are derived, never stored: `path → api:meters:123`, with an optional
//! canonical query suffix and an optional `user:{id}:` partition prefix.

use super::route::path_segments;

/// Namespace shared by every response key.
pub const KEY_NAMESPACE: &str = "api";

/// Builds the cache key for a request.
///
/// - `/api/meters/123/balance/` → `api:meters:123:balance`
/// - query `offset=0&limit=10` → `...:limit=10&offset=0` (sorted by name)
/// - user `user123` → `user:user123:...`
pub fn key_for<I, K, V>(path: &str, query: I, user_id: Option<&str>) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut key = path_segments(path).collect::<Vec<_>>().join(":");

    let query = canonical_query(query);
    if !query.is_empty() {
        key.push(':');
        key.push_str(&query);
    }

    match user_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("user:{}:{}", id, key),
        None => key,
    }
}

/// `name=value` pairs sorted by name and joined by `&`.
///
/// Repeated names keep every value in request order, so `status=a&status=b`
/// and `status=b` never share a key.
pub fn canonical_query<I, K, V>(query: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = query.into_iter().collect();
    pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Rewrites a resource-relative invalidation pattern into key-space globs:
/// the shared slot and every per-user partition.
pub fn scoped_patterns(pattern: &str) -> [String; 2] {
    [
        format!("{}:{}", KEY_NAMESPACE, pattern),
        format!("user:*:{}:{}", KEY_NAMESPACE, pattern),
    ]
}
