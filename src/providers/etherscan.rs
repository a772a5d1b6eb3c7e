//! Etherscan V2 Source Provider
//!
//! Retrieves verified contract source through the multichain V2 endpoint
//! (`chainid` selects the network). Features:
//! 1. Exponential backoff retry with jitter for transport/HTTP failures
//! 2. Tolerant response parsing (`result` as list or object, source in
//!    `SourceCode`/`Sourcecode`, code returned in `message`)
//! 3. Proxy following through `Implementation`, bounded and cycle-checked
//!
//! Every retrieval failure ends as an unavailable `SourceDocument`: the
//! analysis still runs and reports `unverified_code`.

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{AppError, AppResult, ChainId, ErrorCode, ScannerConfig, SourceDocument};
use crate::utils::constants::{
    BASE_RETRY_MS, MAX_PROXY_HOPS, MAX_RETRY_MS, RETRY_JITTER_PERCENT, SOURCE_MARKERS,
    USER_AGENT as USER_AGENT_CONST,
};

// ============================================
// Provider seam
// ============================================

/// Outcome of a source retrieval
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFetch {
    pub document: SourceDocument,
    /// An implementation address was followed to get here
    pub followed_proxy: bool,
}

impl SourceFetch {
    pub fn verified(text: impl Into<String>) -> Self {
        Self {
            document: SourceDocument::verified(text),
            followed_proxy: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            document: SourceDocument::unavailable(),
            followed_proxy: false,
        }
    }

    pub fn through_proxy(mut self) -> Self {
        self.followed_proxy = true;
        self
    }
}

/// Anything that can hand over contract source for an address
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Fetch source for an already validated address.
    ///
    /// Implementations report "no source" as an unavailable document; `Err`
    /// is reserved for failures the caller should log.
    async fn fetch_source(&self, address: &str) -> AppResult<SourceFetch>;

    /// Short provider label for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: SourceProvider + ?Sized> SourceProvider for Arc<T> {
    async fn fetch_source(&self, address: &str) -> AppResult<SourceFetch> {
        (**self).fetch_source(address).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ============================================
// Response parsing
// ============================================

/// What one explorer reply means for the retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerReply {
    /// Verified source text (trimmed, non-empty)
    Source(String),
    /// No source, but the entry points at an implementation contract
    Proxy { implementation: String },
    /// Nothing usable
    Unavailable { code: ErrorCode, reason: String },
}

fn field_str<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn looks_like_source(text: &str) -> bool {
    SOURCE_MARKERS.iter().any(|marker| text.contains(marker))
}

fn is_flagged_proxy(entry: &Value) -> bool {
    let flag = |key: &str| match entry.get(key) {
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            s == "1" || s == "true"
        }
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        Some(Value::Bool(b)) => *b,
        _ => false,
    };
    flag("Proxy") || flag("IsProxy")
}

/// Interpret a decoded `getsourcecode` reply
pub fn parse_explorer_reply(body: &Value) -> ExplorerReply {
    let status = match body.get("status") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::from("0"),
    };
    let message = body.get("message").and_then(Value::as_str).unwrap_or("").trim();

    if status != "1" {
        let detail = body
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or(message);
        let code = if detail.to_lowercase().contains("invalid api")
            || message.to_lowercase().contains("invalid api")
        {
            ErrorCode::ExplorerInvalidApiKey
        } else {
            ErrorCode::ExplorerNotOk
        };
        return ExplorerReply::Unavailable {
            code,
            reason: detail.to_string(),
        };
    }

    let entry = match body.get("result") {
        Some(Value::Array(items)) => items.first().filter(|e| e.is_object()),
        Some(obj) if obj.as_object().is_some_and(|map| !map.is_empty()) => Some(obj),
        _ => None,
    };

    if let Some(source) = entry.and_then(|e| field_str(e, &["SourceCode", "Sourcecode"])) {
        return ExplorerReply::Source(source.to_string());
    }

    if looks_like_source(message) {
        return ExplorerReply::Source(message.to_string());
    }

    if let Some(entry) = entry {
        if is_flagged_proxy(entry) {
            if let Some(implementation) =
                field_str(entry, &["Implementation", "Implementation Address"])
            {
                if implementation.to_lowercase().starts_with("0x") {
                    return ExplorerReply::Proxy {
                        implementation: implementation.to_string(),
                    };
                }
            }
        }
    }

    ExplorerReply::Unavailable {
        code: ErrorCode::ExplorerNotOk,
        reason: "no source code in response".to_string(),
    }
}

// ============================================
// Retry tuning
// ============================================

/// Delay before retry number `attempt` (1-based): base doubling, capped, ± jitter
pub fn retry_delay(attempt: u32) -> Duration {
    let base_delay = BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
    let capped_delay = base_delay.min(MAX_RETRY_MS);

    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    let final_delay = (capped_delay as i64 + jitter).max(100) as u64;

    Duration::from_millis(final_delay)
}

// ============================================
// Etherscan client
// ============================================

pub struct EtherscanClient {
    client: reqwest::Client,
    base_url: String,
    chain: ChainId,
    api_key: String,
    max_retries: u32,
}

impl fmt::Debug for EtherscanClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtherscanClient")
            .field("base_url", &self.base_url)
            .field("chain", &self.chain)
            .field("api_key", &"***")
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl EtherscanClient {
    /// Client for `chain`, API key taken from the environment
    pub fn new(chain: ChainId, config: &ScannerConfig) -> AppResult<Self> {
        let api_key = chain.api_key_from_env();
        if api_key.is_empty() {
            warn!(
                "⚠️ No explorer API key set for {} (requests will likely be rejected)",
                chain.name()
            );
        }
        Self::with_api_key(chain, config, api_key)
    }

    pub fn with_api_key(
        chain: ChainId,
        config: &ScannerConfig,
        api_key: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: Self::build_client(config.request_timeout)?,
            base_url: config.explorer_url.clone(),
            chain,
            api_key: api_key.into(),
            max_retries: config.max_retries.max(1),
        })
    }

    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorCode::Unknown, "Failed to build HTTP client", e)
            })
    }

    /// One `getsourcecode` call with retries
    async fn request_with_retry(&self, address: &str) -> AppResult<Value> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = retry_delay(attempt);
                debug!(
                    "⏳ Retry {}/{} for {} after {}ms",
                    attempt + 1,
                    self.max_retries,
                    address,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.execute_request(address).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if e.code == ErrorCode::ExplorerRateLimited {
                        warn!(
                            "⏳ Explorer rate limited (HTTP 429), backing off (attempt {}/{})",
                            attempt + 1,
                            self.max_retries
                        );
                    }
                    let retry =
                        e.code.is_retryable() || e.code == ErrorCode::ExplorerInvalidResponse;
                    last_error = Some(e);
                    if !retry {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::explorer(
                ErrorCode::ExplorerConnectionFailed,
                format!("No response after {} attempts", self.max_retries),
            )
        }))
    }

    async fn execute_request(&self, address: &str) -> AppResult<Value> {
        let chain_id = self.chain.id().to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address),
                ("chainid", chain_id.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl SourceProvider for EtherscanClient {
    async fn fetch_source(&self, address: &str) -> AppResult<SourceFetch> {
        let mut current = address.to_string();
        let mut visited = vec![address.to_lowercase()];
        let mut followed_proxy = false;

        let outcome = loop {
            let body = match self.request_with_retry(&current).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        "⚠️ Source retrieval failed for {} on {}: {}",
                        current,
                        self.chain.name(),
                        e
                    );
                    break SourceFetch::unavailable();
                }
            };

            match parse_explorer_reply(&body) {
                ExplorerReply::Source(text) => {
                    debug!("📄 Source retrieved for {} ({} bytes)", current, text.len());
                    break SourceFetch::verified(text);
                }
                ExplorerReply::Proxy { implementation } => {
                    followed_proxy = true;
                    let key = implementation.to_lowercase();
                    if visited.contains(&key) || visited.len() > MAX_PROXY_HOPS {
                        warn!(
                            code = ErrorCode::ExplorerProxyLoop.as_str(),
                            "⚠️ Proxy chain for {} stopped at {} after {} hops",
                            address,
                            implementation,
                            visited.len() - 1
                        );
                        break SourceFetch::unavailable();
                    }
                    info!("🔀 Following proxy {} -> {}", current, implementation);
                    visited.push(key);
                    current = implementation;
                }
                ExplorerReply::Unavailable { code, reason } => {
                    if code == ErrorCode::ExplorerInvalidApiKey {
                        warn!(
                            code = code.as_str(),
                            "🔑 Explorer rejected the API key for {}: {}",
                            self.chain.name(),
                            reason
                        );
                    } else {
                        debug!(code = code.as_str(), "No source for {}: {}", current, reason);
                    }
                    break SourceFetch::unavailable();
                }
            }
        };

        Ok(if followed_proxy {
            outcome.through_proxy()
        } else {
            outcome
        })
    }

    fn name(&self) -> &str {
        "etherscan-v2"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_in_list() {
        let body = json!({
            "status": "1",
            "message": "OK",
            "result": [{ "SourceCode": "  contract A {}  ", "Proxy": "0" }]
        });
        assert_eq!(
            parse_explorer_reply(&body),
            ExplorerReply::Source("contract A {}".to_string())
        );
    }

    #[test]
    fn test_source_in_object_lowercase_key() {
        let body = json!({
            "status": "1",
            "result": { "Sourcecode": "pragma solidity ^0.8.0;" }
        });
        assert_eq!(
            parse_explorer_reply(&body),
            ExplorerReply::Source("pragma solidity ^0.8.0;".to_string())
        );
    }

    #[test]
    fn test_source_in_message_fallback() {
        let body = json!({
            "status": "1",
            "message": "pragma solidity 0.8.20; contract T {}",
            "result": []
        });
        assert!(matches!(parse_explorer_reply(&body), ExplorerReply::Source(_)));

        let plain = json!({ "status": "1", "message": "OK", "result": [] });
        assert!(matches!(
            parse_explorer_reply(&plain),
            ExplorerReply::Unavailable { .. }
        ));
    }

    #[test]
    fn test_proxy_entry() {
        let body = json!({
            "status": "1",
            "result": [{
                "SourceCode": "",
                "Proxy": "1",
                "Implementation": "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd"
            }]
        });
        assert_eq!(
            parse_explorer_reply(&body),
            ExplorerReply::Proxy {
                implementation: "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd".to_string()
            }
        );

        let alt = json!({
            "status": "1",
            "result": [{ "IsProxy": "true", "Implementation Address": "0x01" }]
        });
        assert!(matches!(parse_explorer_reply(&alt), ExplorerReply::Proxy { .. }));
    }

    #[test]
    fn test_proxy_without_valid_implementation() {
        let body = json!({
            "status": "1",
            "result": [{ "SourceCode": "", "Proxy": "1", "Implementation": "" }]
        });
        assert!(matches!(
            parse_explorer_reply(&body),
            ExplorerReply::Unavailable { .. }
        ));
    }

    #[test]
    fn test_invalid_api_key() {
        let body = json!({ "status": "0", "message": "NOTOK", "result": "Invalid API Key" });
        match parse_explorer_reply(&body) {
            ExplorerReply::Unavailable { code, .. } => {
                assert_eq!(code, ErrorCode::ExplorerInvalidApiKey)
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_not_ok_status() {
        let body = json!({ "status": "0", "message": "NOTOK", "result": "Max rate limit reached" });
        match parse_explorer_reply(&body) {
            ExplorerReply::Unavailable { code, reason } => {
                assert_eq!(code, ErrorCode::ExplorerNotOk);
                assert_eq!(reason, "Max rate limit reached");
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        assert!(matches!(
            parse_explorer_reply(&json!({})),
            ExplorerReply::Unavailable { .. }
        ));
    }

    #[test]
    fn test_retry_delay_bounds() {
        for attempt in 1..8 {
            let ms = retry_delay(attempt).as_millis() as u64;
            assert!(ms >= 100);
            assert!(ms <= MAX_RETRY_MS + MAX_RETRY_MS * RETRY_JITTER_PERCENT / 100);
        }
        let first = retry_delay(1).as_millis() as u64;
        assert!((400..=600).contains(&first));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client =
            EtherscanClient::with_api_key(ChainId::Ethereum, &ScannerConfig::default(), "SECRET")
                .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("SECRET"));
        assert_eq!(client.name(), "etherscan-v2");
    }
}
