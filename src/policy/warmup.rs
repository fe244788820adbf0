//! Warmup routes

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupRoute {
    pub route: String,
    pub params: BTreeMap<String, String>,
    /// Lower numbers are warmed first.
    pub priority: u32,
}

impl WarmupRoute {
    pub fn new(route: &str, params: &[(&str, &str)], priority: u32) -> Self {
        Self {
            route: route.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            priority,
        }
    }
}

/// High-traffic list endpoints, sorted by priority.
pub fn default_routes() -> Vec<WarmupRoute> {
    let mut routes = vec![
        WarmupRoute::new("/api/meters", &[("limit", "20"), ("offset", "0")], 1),
        WarmupRoute::new("/api/tariffs", &[("limit", "50"), ("offset", "0")], 1),
        WarmupRoute::new("/api/service-fees", &[("limit", "50"), ("offset", "0")], 2),
        WarmupRoute::new(
            "/api/meters",
            &[("limit", "20"), ("offset", "0"), ("status", "active")],
            2,
        ),
        WarmupRoute::new(
            "/api/meters",
            &[("limit", "20"), ("offset", "0"), ("status", "inactive")],
            3,
        ),
        WarmupRoute::new("/api/properties", &[("limit", "20"), ("offset", "0")], 3),
    ];
    routes.sort_by_key(|r| r.priority);
    routes
}
