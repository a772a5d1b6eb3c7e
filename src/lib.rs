//! Honeypot Scanner Library
//!
//! Lexical risk scanner for verified smart-contract source. Detects common
//! honeypot and rug-pull patterns:
//! - Adjustable taxes/fees and public fee setters
//! - Blacklists, sell guards on the AMM pair, owner-gated transfers
//! - Active ownership, minting, trading pauses, strict wallet limits
//! - Proxy/upgradeable logic and unverified source
//!
//! Structure:
//! - `models`: flags, reports, errors, configuration
//! - `core`: detectors, scoring, summaries, the analyzer
//! - `providers`: contract source retrieval (Etherscan V2)
//! - `api`: axum HTTP service
//! - `utils`: constants and telemetry

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    build_report, classify_risk, compute_score, generate_summary, run_all_checks,
    validate_address, Analysis, ContractAnalyzer, FlagDescriptions, FlagWeights,
};
pub use models::{
    AppError, AppResult, ChainId, ErrorCode, FlagSet, RiskFlag, RiskLevel, RiskReport,
    ScannerConfig, ScoringConfig, SourceDocument,
};
pub use providers::{EtherscanClient, SourceFetch, SourceProvider};
pub use utils::telemetry::{ScanStats, ScanTelemetry};
