//! API Middleware (Auth, Rate Limiting, Logging)

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::types::{ApiError, ApiResponse};
use crate::utils::constants::{DEFAULT_RATE_LIMIT, RATE_LIMIT_WINDOW_SECS};

/// Header carrying the per-request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per window
    pub requests_per_window: u32,
    /// Window duration
    pub window_duration: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: DEFAULT_RATE_LIMIT,
            window_duration: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
        }
    }
}

impl RateLimitConfig {
    /// `HDP_RATE_LIMIT` requests per window, default otherwise
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("HDP_RATE_LIMIT") {
            match raw.trim().parse::<u32>() {
                Ok(limit) if limit > 0 => config.requests_per_window = limit,
                _ => warn!("⚠️ Ignoring invalid HDP_RATE_LIMIT={:?}", raw),
            }
        }
        config
    }
}

/// In-memory fixed-window rate limiter
pub struct RateLimiter {
    /// Request counts per IP/API key
    requests: DashMap<String, (u32, Instant)>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: DashMap::new(),
            config,
        }
    }

    /// Check if request is allowed, returns (allowed, remaining, reset_seconds)
    pub fn check(&self, key: &str) -> (bool, u32, u64) {
        let now = Instant::now();

        let mut entry = self.requests.entry(key.to_string()).or_insert((0, now));

        // Reset window if expired
        if now.duration_since(entry.1) > self.config.window_duration {
            entry.0 = 0;
            entry.1 = now;
        }

        let reset_secs = self
            .config
            .window_duration
            .saturating_sub(now.duration_since(entry.1))
            .as_secs();

        if entry.0 >= self.config.requests_per_window {
            return (false, 0, reset_secs);
        }

        entry.0 += 1;
        let remaining = self.config.requests_per_window - entry.0;
        (true, remaining, reset_secs)
    }

    /// Drop entries idle for two windows; returns how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.requests.len();
        self.requests.retain(|_, (_, timestamp)| {
            now.duration_since(*timestamp) < self.config.window_duration * 2
        });
        before.saturating_sub(self.requests.len())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

// Global rate limiter and key set, read from the environment on first use
lazy_static::lazy_static! {
    pub static ref RATE_LIMITER: Arc<RateLimiter> =
        Arc::new(RateLimiter::new(RateLimitConfig::from_env()));

    static ref API_KEYS: Option<HashSet<String>> =
        parse_api_keys(std::env::var("HDP_API_KEYS").ok());
}

/// Comma-separated key list; `None` (open API) when unset or empty
fn parse_api_keys(raw: Option<String>) -> Option<HashSet<String>> {
    let keys: HashSet<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();
    (!keys.is_empty()).then_some(keys)
}

/// Periodically purge stale rate-limit entries
pub fn start_cleanup_task() {
    tokio::spawn(async {
        let mut interval = tokio::time::interval(Duration::from_secs(RATE_LIMIT_WINDOW_SECS));
        loop {
            interval.tick().await;
            let removed = RATE_LIMITER.cleanup();
            if removed > 0 {
                debug!("🧹 Rate limiter cleanup: {} stale entries removed", removed);
            }
        }
    });
}

fn is_health_path(path: &str) -> bool {
    path == "/health" || path == "/v1/health"
}

fn api_key_header(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-api-key").and_then(|v| v.to_str().ok())
}

fn error_response(status: StatusCode, error: ApiError) -> Response {
    (status, Json(ApiResponse::error(error, 0.0))).into_response()
}

/// API Key authentication middleware
pub async fn auth_middleware(headers: HeaderMap, request: Request, next: Next) -> Response {
    let Some(keys) = API_KEYS.as_ref() else {
        return next.run(request).await;
    };

    if is_health_path(request.uri().path()) {
        return next.run(request).await;
    }

    match api_key_header(&headers) {
        Some(key) if keys.contains(key) => next.run(request).await,
        Some(_) => {
            warn!("Invalid API key attempted");
            error_response(StatusCode::UNAUTHORIZED, ApiError::unauthorized())
        }
        None => error_response(StatusCode::UNAUTHORIZED, ApiError::unauthorized()),
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(headers: HeaderMap, request: Request, next: Next) -> Response {
    // Skip rate limiting for health check
    if is_health_path(request.uri().path()) {
        return next.run(request).await;
    }

    // Get rate limit key (API key or IP)
    let rate_key = api_key_header(&headers)
        .map(|k| format!("key:{}", k))
        .unwrap_or_else(|| {
            let ip = headers
                .get("x-forwarded-for")
                .or_else(|| headers.get("x-real-ip"))
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .unwrap_or("unknown");
            format!("ip:{}", ip)
        });

    let (allowed, remaining, reset) = RATE_LIMITER.check(&rate_key);

    if !allowed {
        let subject = if rate_key.starts_with("key:") {
            "api key"
        } else {
            rate_key.as_str()
        };
        warn!("Rate limit exceeded for {}", subject);
        let mut response =
            error_response(StatusCode::TOO_MANY_REQUESTS, ApiError::rate_limited(reset));
        response.headers_mut().insert("Retry-After", reset.into());
        return response;
    }

    let mut response = next.run(request).await;

    // Add rate limit headers
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Remaining", remaining.into());
    headers.insert("X-RateLimit-Reset", reset.into());

    response
}

/// Request logging middleware; tags each request with an id
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = uuid::Uuid::new_v4().to_string();

    let mut response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}
