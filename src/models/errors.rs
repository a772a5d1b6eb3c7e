//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so it can be grepped in logs
//! and mapped to an HTTP status.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - INPUT_xxx: request validation
//! - EXPLORER_xxx: source retrieval
//! - API_xxx: HTTP layer
//! - CFG_xxx: configuration

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code.http_status())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Input Errors
    // ============================================
    /// Address is not 0x + 40 hex digits
    InvalidAddress,
    /// Chain name/id not in the registry
    UnsupportedChain,

    // ============================================
    // Explorer Errors
    // ============================================
    /// Could not reach the explorer
    ExplorerConnectionFailed,
    /// Explorer request timed out
    ExplorerTimeout,
    /// Explorer returned HTTP 429
    ExplorerRateLimited,
    /// Explorer returned a non-success HTTP status
    ExplorerHttpError,
    /// Body could not be decoded
    ExplorerInvalidResponse,
    /// Explorer rejected the API key
    ExplorerInvalidApiKey,
    /// Explorer answered with a non-OK status (quota, unknown contract, ...)
    ExplorerNotOk,
    /// Proxy chain longer than allowed, or cyclic
    ExplorerProxyLoop,

    // ============================================
    // API Errors
    // ============================================
    ApiBadRequest,
    ApiUnauthorized,
    ApiRateLimited,
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "INPUT_INVALID_ADDRESS",
            Self::UnsupportedChain => "INPUT_UNSUPPORTED_CHAIN",

            Self::ExplorerConnectionFailed => "EXPLORER_CONNECTION_FAILED",
            Self::ExplorerTimeout => "EXPLORER_TIMEOUT",
            Self::ExplorerRateLimited => "EXPLORER_RATE_LIMITED",
            Self::ExplorerHttpError => "EXPLORER_HTTP_ERROR",
            Self::ExplorerInvalidResponse => "EXPLORER_INVALID_RESPONSE",
            Self::ExplorerInvalidApiKey => "EXPLORER_INVALID_API_KEY",
            Self::ExplorerNotOk => "EXPLORER_NOT_OK",
            Self::ExplorerProxyLoop => "EXPLORER_PROXY_LOOP",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidAddress | Self::UnsupportedChain | Self::ApiBadRequest => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }

    /// Check if a failed explorer call is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExplorerConnectionFailed
                | Self::ExplorerTimeout
                | Self::ExplorerRateLimited
                | Self::ExplorerHttpError
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn invalid_address(address: &str) -> Self {
        Self::new(
            ErrorCode::InvalidAddress,
            format!("Invalid contract address: {}", address),
        )
    }

    pub fn unsupported_chain(chain: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedChain,
            format!("Unsupported chain: {}", chain),
        )
    }

    pub fn explorer(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new(code, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExplorerTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ExplorerConnectionFailed, "Connection failed")
        } else if err.is_decode() {
            Self::new(ErrorCode::ExplorerInvalidResponse, err.to_string())
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                Self::new(ErrorCode::ExplorerRateLimited, "Rate limited (HTTP 429)")
            } else {
                Self::new(ErrorCode::ExplorerHttpError, format!("HTTP error: {}", status))
            }
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ExplorerInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::invalid_address("0x12");
        assert_eq!(err.code, ErrorCode::InvalidAddress);
        assert_eq!(err.code_str(), "INPUT_INVALID_ADDRESS");
        assert_eq!(err.to_string(), "[INPUT_INVALID_ADDRESS] Invalid contract address: 0x12");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::ExplorerTimeout.is_retryable());
        assert!(ErrorCode::ExplorerRateLimited.is_retryable());
        assert!(!ErrorCode::ExplorerInvalidApiKey.is_retryable());
        assert!(!ErrorCode::ExplorerNotOk.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::InvalidAddress.http_status(), 400);
        assert_eq!(ErrorCode::UnsupportedChain.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::ApiInternalError.http_status(), 500);
    }

    #[test]
    fn test_client_error() {
        assert!(AppError::unsupported_chain("solana").is_client_error());
        assert!(!AppError::internal("boom").is_client_error());
    }
}
