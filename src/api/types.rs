//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::models::{AppError, ErrorCode, RiskReport};
use crate::utils::constants::MAX_BATCH_CONCURRENCY;

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ApiBadRequest.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            code: ErrorCode::ApiUnauthorized.as_str().to_string(),
            message: "Invalid or missing API key".to_string(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: ErrorCode::ApiRateLimited.as_str().to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

/// Error body of the plain analyze endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
}

// ============================================
// Single Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub address: String,
    /// Chain name or id; defaults to Ethereum
    #[serde(default)]
    pub chain: Option<String>,
}

// ============================================
// Batch Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct BatchAnalyzeRequest {
    pub addresses: Vec<String>,
    #[serde(default)]
    pub chain: Option<String>,
    /// Max concurrent analyses (clamped to 1..=10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    MAX_BATCH_CONCURRENCY / 2
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchAnalyzeData {
    pub chain: String,
    pub total_requested: usize,
    pub total_processed: usize,
    pub total_safe: usize,
    pub total_medium: usize,
    pub total_high: usize,
    pub total_errors: usize,
    pub results: Vec<BatchItemResult>,
    pub processing_time_ms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub address: String,
    pub status: String, // "success" | "error"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RiskReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
}

// ============================================
// Stats / Telemetry
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsData {
    pub total_analyzed: u64,
    pub safe: u64,
    pub medium: u64,
    pub high: u64,
    pub unverified: u64,
    pub proxies_followed: u64,
    pub rejected: u64,
    pub avg_latency_ms: f64,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_codes_match_registry() {
        assert_eq!(ApiError::bad_request("x").code, ErrorCode::ApiBadRequest.as_str());
        assert_eq!(ApiError::unauthorized().code, ErrorCode::ApiUnauthorized.as_str());
        assert_eq!(ApiError::rate_limited(30).code, ErrorCode::ApiRateLimited.as_str());
        assert_eq!(ErrorCode::ApiUnauthorized.http_status(), 401);
    }
}
