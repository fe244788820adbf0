//! Request DTOs for the cache admin API
//!
//! Both bodies carry a single optional parameter. A missing, empty or
//! whitespace-only value is reported as absent by `required()`.

use serde::Deserialize;

/// Request body for `POST /api/cache/clear-pattern`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearPatternRequest {
    /// Raw key glob, e.g. `user:*:api:meters*`
    #[serde(default)]
    pub pattern: Option<String>,
}

impl ClearPatternRequest {
    pub fn required(&self) -> Option<&str> {
        non_blank(self.pattern.as_deref())
    }
}

/// Request body for `POST /api/cache/invalidate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateRequest {
    /// Mutated route (`/api/meters/1`) or named operation (`meter_update`)
    #[serde(default)]
    pub operation: Option<String>,
}

impl InvalidateRequest {
    pub fn required(&self) -> Option<&str> {
        non_blank(self.operation.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
