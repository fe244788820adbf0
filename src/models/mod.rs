//! Request and Response models for the cache admin API
//!
//! DTOs serialized into the `{status, message?, data?}` envelope.

pub mod requests;
pub mod responses;

pub use requests::{ClearPatternRequest, InvalidateRequest};
pub use responses::{
    ApiResponse, ClearPatternData, HealthReport, HealthStatus, InvalidateData, KeyInfo,
    WarmupData,
};
