//! Configuration module for the honeypot scanner
//!
//! Chain registry, environment-driven scanner settings and the scoring
//! tables. Everything here is built once at process start and shared
//! read-only afterwards.

use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::{AppError, AppResult};
use crate::core::report::FlagDescriptions;
use crate::core::risk_score::FlagWeights;
use crate::utils::constants::{
    get_api_key_env, get_chain_name, CHAIN_ID_ARBITRUM, CHAIN_ID_AVALANCHE,
    CHAIN_ID_BASE, CHAIN_ID_BSC, CHAIN_ID_ETHEREUM, CHAIN_ID_OPTIMISM, CHAIN_ID_POLYGON,
    DEFAULT_API_KEY_ENV, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, ETHERSCAN_V2_BASE,
};

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainId {
    #[default]
    Ethereum = 1,
    BinanceSmartChain = 56,
    Polygon = 137,
    Arbitrum = 42161,
    Optimism = 10,
    Avalanche = 43114,
    Base = 8453,
}

impl ChainId {
    /// Get chain from numeric ID
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            CHAIN_ID_ETHEREUM => Some(Self::Ethereum),
            CHAIN_ID_BSC => Some(Self::BinanceSmartChain),
            CHAIN_ID_POLYGON => Some(Self::Polygon),
            CHAIN_ID_ARBITRUM => Some(Self::Arbitrum),
            CHAIN_ID_OPTIMISM => Some(Self::Optimism),
            CHAIN_ID_AVALANCHE => Some(Self::Avalanche),
            CHAIN_ID_BASE => Some(Self::Base),
            _ => None,
        }
    }

    /// Resolve an optional user-supplied chain, defaulting to Ethereum
    pub fn resolve(chain: Option<&str>) -> AppResult<Self> {
        match chain.map(str::trim).filter(|c| !c.is_empty()) {
            Some(name) => name.parse(),
            None => Ok(Self::default()),
        }
    }

    /// Numeric chain ID as sent in `chainid`
    pub fn id(&self) -> u64 {
        *self as u64
    }

    /// Short lowercase key used on the CLI and in requests
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::BinanceSmartChain => "bsc",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
            Self::Avalanche => "avalanche",
            Self::Base => "base",
        }
    }

    /// Get chain name (delegates to constants)
    pub fn name(&self) -> &'static str {
        get_chain_name(self.id())
    }

    /// API key for this chain: chain-specific variable first, then the shared one.
    /// The key is never logged.
    pub fn api_key_from_env(&self) -> String {
        let preferred = get_api_key_env(self.id());
        std::env::var(preferred)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(DEFAULT_API_KEY_ENV).ok())
            .unwrap_or_default()
    }
}

impl FromStr for ChainId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let chain = match lowered.as_str() {
            "ethereum" | "eth" | "mainnet" => Some(Self::Ethereum),
            "bsc" | "bnb" | "binance" => Some(Self::BinanceSmartChain),
            "polygon" | "matic" => Some(Self::Polygon),
            "arbitrum" | "arb" => Some(Self::Arbitrum),
            "optimism" | "op" => Some(Self::Optimism),
            "avalanche" | "avax" => Some(Self::Avalanche),
            "base" => Some(Self::Base),
            other => other.parse::<u64>().ok().and_then(Self::from_id),
        };
        chain.ok_or_else(|| AppError::unsupported_chain(s.trim()))
    }
}

/// Explorer access settings
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Explorer API base URL
    pub explorer_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Attempts per explorer request (at least 1)
    pub max_retries: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            explorer_url: ETHERSCAN_V2_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ScannerConfig {
    /// Read settings from the environment.
    ///
    /// `HDP_EXPLORER_URL`, `HDP_TIMEOUT_SECS`, `HDP_MAX_RETRIES`. Unparseable
    /// numbers fall back to defaults with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let explorer_url = std::env::var("HDP_EXPLORER_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(defaults.explorer_url);

        let request_timeout = env_number::<u64>("HDP_TIMEOUT_SECS")
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let max_retries = env_number::<u32>("HDP_MAX_RETRIES")
            .map(|n| n.max(1))
            .unwrap_or(defaults.max_retries);

        debug!(
            explorer = %explorer_url,
            timeout_secs = request_timeout.as_secs(),
            max_retries,
            "Scanner config loaded"
        );

        Self {
            explorer_url,
            request_timeout,
            max_retries,
        }
    }
}

fn env_number<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("⚠️ Ignoring invalid {}={:?}", name, raw);
            None
        }
    }
}

/// Weight and description tables used by the scorer and summarizer
#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    pub weights: FlagWeights,
    pub descriptions: FlagDescriptions,
}

impl ScoringConfig {
    /// Default tables plus `HDP_FLAG_WEIGHTS` overrides (e.g. `minting=3,proxy_pattern=1`)
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();
        if let Ok(overrides) = std::env::var("HDP_FLAG_WEIGHTS") {
            if !overrides.trim().is_empty() {
                config.weights = config.weights.with_overrides(&overrides)?;
                info!("⚖️ Flag weight overrides applied: {}", overrides.trim());
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    #[test]
    fn test_chain_aliases() {
        assert_eq!("ethereum".parse::<ChainId>().unwrap(), ChainId::Ethereum);
        assert_eq!("ETH".parse::<ChainId>().unwrap(), ChainId::Ethereum);
        assert_eq!(" bsc ".parse::<ChainId>().unwrap(), ChainId::BinanceSmartChain);
        assert_eq!("Polygon".parse::<ChainId>().unwrap(), ChainId::Polygon);
        assert_eq!("137".parse::<ChainId>().unwrap(), ChainId::Polygon);
        assert_eq!("8453".parse::<ChainId>().unwrap(), ChainId::Base);
    }

    #[test]
    fn test_unknown_chain_is_client_error() {
        let err = "solana".parse::<ChainId>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedChain);
        assert!(err.is_client_error());

        assert!("999".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_resolve_defaults_to_ethereum() {
        assert_eq!(ChainId::resolve(None).unwrap(), ChainId::Ethereum);
        assert_eq!(ChainId::resolve(Some("  ")).unwrap(), ChainId::Ethereum);
        assert_eq!(ChainId::resolve(Some("bsc")).unwrap().id(), 56);
    }

    #[test]
    fn test_chain_metadata() {
        assert_eq!(ChainId::Polygon.name(), "Polygon");
        assert_eq!(ChainId::BinanceSmartChain.key(), "bsc");
        for id in [1, 56, 137, 42161, 10, 43114, 8453] {
            let chain = ChainId::from_id(id).unwrap();
            assert_eq!(chain.id(), id);
            assert_eq!(chain.key().parse::<ChainId>().unwrap(), chain);
        }
    }

    #[test]
    fn test_scanner_config_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.explorer_url, ETHERSCAN_V2_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.max_retries, 3);
    }
}
