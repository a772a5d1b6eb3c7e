//! Constants Module - Single Source of Truth
//!
//! Chain identifiers, explorer endpoints, retry tuning and scoring limits.
//! Other modules import from here instead of hardcoding values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "HoneypotScanner";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for explorer requests
pub const USER_AGENT: &str = concat!("HoneypotScanner/", env!("CARGO_PKG_VERSION"));

// ============================================
// EXPLORER CONSTANTS
// ============================================

/// Etherscan V2 multichain endpoint (chain selected with `chainid`)
pub const ETHERSCAN_V2_BASE: &str = "https://api.etherscan.io/v2/api";

/// Fallback API key variable shared by all chains
pub const DEFAULT_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Default timeout for explorer requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default number of attempts per explorer request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// First retry delay (milliseconds), doubled per attempt
pub const BASE_RETRY_MS: u64 = 500;

/// Retry delay cap (milliseconds)
pub const MAX_RETRY_MS: u64 = 4000;

/// Random jitter applied to each retry delay (+/- percent)
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Maximum implementation hops followed for proxy contracts
pub const MAX_PROXY_HOPS: usize = 3;

/// Markers that identify contract source returned in `message`
pub const SOURCE_MARKERS: [&str; 4] = ["pragma solidity", "contract ", "library ", "interface "];

// ============================================
// SCORING CONSTANTS
// ============================================

/// Upper bound of the risk score
pub const MAX_SCORE: u8 = 10;

/// Weight used for a flag missing from the weight table
pub const DEFAULT_FLAG_WEIGHT: u8 = 1;

/// Summary used when no flag is active
pub const BENIGN_SUMMARY: &str = "No obvious red flags detected in the contract source.";

// ============================================
// API CONSTANTS
// ============================================

/// Default requests per rate-limit window
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Rate-limit window (seconds)
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Maximum addresses per batch request
pub const MAX_BATCH_SIZE: usize = 50;

/// Maximum concurrent analyses within one batch
pub const MAX_BATCH_CONCURRENCY: usize = 10;

/// Default API port
pub const DEFAULT_PORT: u16 = 8080;

// ============================================
// CHAIN IDS
// ============================================

pub const CHAIN_ID_ETHEREUM: u64 = 1;
pub const CHAIN_ID_BSC: u64 = 56;
pub const CHAIN_ID_POLYGON: u64 = 137;
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
pub const CHAIN_ID_OPTIMISM: u64 = 10;
pub const CHAIN_ID_AVALANCHE: u64 = 43114;
pub const CHAIN_ID_BASE: u64 = 8453;

// ============================================
// CHAIN METADATA
// ============================================

/// Get chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_BSC => "BNB Smart Chain",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_AVALANCHE => "Avalanche C-Chain",
        CHAIN_ID_BASE => "Base",
        _ => "Unknown",
    }
}

/// Chain-specific API key variable (falls back to `DEFAULT_API_KEY_ENV`)
pub fn get_api_key_env(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_BSC => "BSCSCAN_API_KEY",
        CHAIN_ID_POLYGON => "POLYGONSCAN_API_KEY",
        CHAIN_ID_ARBITRUM => "ARBISCAN_API_KEY",
        CHAIN_ID_OPTIMISM => "OPTIMISM_API_KEY",
        CHAIN_ID_AVALANCHE => "SNOWTRACE_API_KEY",
        CHAIN_ID_BASE => "BASESCAN_API_KEY",
        _ => DEFAULT_API_KEY_ENV,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_env() {
        assert_eq!(get_api_key_env(CHAIN_ID_ETHEREUM), "ETHERSCAN_API_KEY");
        assert_eq!(get_api_key_env(CHAIN_ID_BSC), "BSCSCAN_API_KEY");
        assert_eq!(get_api_key_env(CHAIN_ID_POLYGON), "POLYGONSCAN_API_KEY");
    }

    #[test]
    fn test_benign_summary_not_empty() {
        assert!(!BENIGN_SUMMARY.is_empty());
    }
}
