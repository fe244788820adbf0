//! Response DTOs for the cache admin API
//!
//! Every admin endpoint answers with [`ApiResponse`]; the structs below are the
//! `data` payloads.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{format_bytes, StatsSnapshot, TTL_MISSING};

/// Warning raised when the hit ratio is under the health threshold.
pub const LOW_HIT_RATIO: &str = "Low cache hit ratio";
/// Warning raised when more clients share the store than the policy allows.
pub const HIGH_CONNECTIONS: &str = "High number of connected clients";
/// Warning raised when the store did not answer.
pub const STORE_UNREACHABLE: &str = "Cache store unreachable";

/// Envelope: `{ "status": "success" | "error", "message"?: ..., "data"?: ... }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T = Value> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: None,
        }
    }
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// `data` of `GET /api/cache/health`
///
/// `status` follows the hit ratio alone; `warnings` lists every concern found.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub hit_ratio: f64,
    pub is_connected: bool,
    pub threshold: f64,
    pub memory_usage: String,
    pub connections: usize,
    pub warnings: Vec<String>,
}

impl HealthReport {
    pub fn evaluate(stats: &StatsSnapshot, threshold: f64, connection_limit: usize) -> Self {
        let mut warnings = Vec::new();
        let status = if stats.hit_ratio >= threshold {
            HealthStatus::Healthy
        } else {
            warnings.push(LOW_HIT_RATIO.to_string());
            HealthStatus::Degraded
        };
        if stats.connections > connection_limit {
            warnings.push(HIGH_CONNECTIONS.to_string());
        }

        Self {
            status,
            hit_ratio: stats.hit_ratio,
            is_connected: true,
            threshold,
            memory_usage: stats.memory_usage_human.clone(),
            connections: stats.connections,
            warnings,
        }
    }

    /// Report for a store that did not answer.
    pub fn disconnected(threshold: f64) -> Self {
        Self {
            status: HealthStatus::Degraded,
            hit_ratio: 0.0,
            is_connected: false,
            threshold,
            memory_usage: format_bytes(0),
            connections: 0,
            warnings: vec![STORE_UNREACHABLE.to_string()],
        }
    }
}

/// `data` of `GET /api/cache/key/:key`
#[derive(Debug, Clone, Serialize)]
pub struct KeyInfo {
    pub key: String,
    pub exists: bool,
    /// Seconds remaining, `-1` without expiry, `-2` when absent
    pub ttl: i64,
    /// Bytes of the stored text
    pub size: usize,
    /// `null` when absent or when the stored text is not JSON
    pub value: Option<Value>,
}

impl KeyInfo {
    pub fn absent(key: &str) -> Self {
        Self {
            key: key.to_string(),
            exists: false,
            ttl: TTL_MISSING,
            size: 0,
            value: None,
        }
    }
}

/// `data` of `POST /api/cache/clear-pattern`
#[derive(Debug, Clone, Serialize)]
pub struct ClearPatternData {
    pub pattern: String,
    pub cleared_keys: usize,
}

/// `data` of `POST /api/cache/invalidate`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateData {
    pub operation: String,
    pub patterns: Vec<String>,
    pub invalidated_keys: usize,
}

/// `data` of `POST /api/cache/warmup`
#[derive(Debug, Clone, Serialize)]
pub struct WarmupData {
    pub warmed_routes: usize,
}
