//! Integration tests for the analysis pipeline

use async_trait::async_trait;
use honeypot_scanner::{
    run_all_checks, AppResult, ContractAnalyzer, ErrorCode, FlagSet, RiskFlag, RiskLevel,
    ScoringConfig, SourceDocument, SourceFetch, SourceProvider,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

const SIMPLE_ERC20: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

import "@openzeppelin/contracts/token/ERC20/ERC20.sol";

contract MyToken is ERC20 {
    constructor() ERC20("My Token", "MYT") {
        _mint(msg.sender, 1000000 * (10 ** decimals()));
    }
}
"#;

const HONEYPOT_SNIPPET: &str = r#"
// Honeypot example with restrictive sell
pragma solidity ^0.8.0;

contract EvilToken {
    mapping(address => bool) private blacklist;
    address public owner;
    uint256 public buyFee;
    uint256 public sellFee;

    modifier onlyOwner() {
        require(msg.sender == owner, "not owner");
        _;
    }

    function setTax(uint256 _buy, uint256 _sell) external onlyOwner {
        buyFee = _buy;
        sellFee = _sell;
    }

    function addToBlacklist(address user) external onlyOwner {
        blacklist[user] = true;
    }

    function _transfer(address from, address to, uint256 amount) internal {
        require(to != uniswapPair, "no sell");
        super._transfer(from, to, amount);
    }
}
"#;

const PROXY_CODE: &str = r#"
pragma solidity ^0.8.0;
contract Proxy {
    address public implementation;
    function upgradeTo(address newImpl) external {
        implementation = newImpl;
    }
    fallback() external payable {
        (bool success, ) = implementation.delegatecall(msg.data);
        require(success);
    }
}
"#;

/// Serves canned fetch results by address
#[derive(Default)]
struct StubProvider {
    sources: HashMap<String, SourceFetch>,
}

impl StubProvider {
    fn with(mut self, address: &str, fetch: SourceFetch) -> Self {
        self.sources.insert(address.to_lowercase(), fetch);
        self
    }
}

#[async_trait]
impl SourceProvider for StubProvider {
    async fn fetch_source(&self, address: &str) -> AppResult<SourceFetch> {
        Ok(self
            .sources
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_else(SourceFetch::unavailable))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn analyzer(provider: StubProvider) -> ContractAnalyzer<StubProvider> {
    ContractAnalyzer::new(provider, Arc::new(ScoringConfig::default()))
}

#[test]
fn test_simple_erc20_only_mints() {
    let flags = run_all_checks(SIMPLE_ERC20, true);
    let active: Vec<RiskFlag> = flags.active().collect();
    assert_eq!(active, vec![RiskFlag::Minting]);
}

#[test]
fn test_honeypot_snippet_flags() {
    let flags = run_all_checks(HONEYPOT_SNIPPET, true);
    assert!(flags.get(RiskFlag::ModifiableFee));
    assert!(flags.get(RiskFlag::BlacklistWhitelist));
    assert!(flags.get(RiskFlag::UniswapRestriction));
    assert!(flags.get(RiskFlag::OwnerNotRenounced));
    assert!(flags.get(RiskFlag::DynamicFeesPublic));
    assert!(!flags.get(RiskFlag::Minting));
    assert!(!flags.get(RiskFlag::ProxyPattern));
    assert!(!flags.get(RiskFlag::UnverifiedCode));
}

#[test]
fn test_proxy_code_detected() {
    assert!(run_all_checks(PROXY_CODE, true).get(RiskFlag::ProxyPattern));
}

#[tokio::test]
async fn test_honeypot_is_high_risk() {
    let provider = StubProvider::default().with(ADDRESS, SourceFetch::verified(HONEYPOT_SNIPPET));
    let report = analyzer(provider).analyze(ADDRESS).await.unwrap();

    assert_eq!(report.address, ADDRESS);
    assert_eq!(report.score, 9);
    assert_eq!(report.risk, RiskLevel::High);
    assert_eq!(
        report.flags,
        vec![
            RiskFlag::ModifiableFee,
            RiskFlag::BlacklistWhitelist,
            RiskFlag::UniswapRestriction,
            RiskFlag::OwnerNotRenounced,
            RiskFlag::DynamicFeesPublic,
        ]
    );
    assert!(report.summary.starts_with("Contract allows tax or fee parameters"));
}

#[tokio::test]
async fn test_fee_blacklist_guard_without_owner() {
    // Fee setter + blacklist + AMM guard, no owner constructs
    let code = r#"
        mapping(address => bool) blacklist;
        function setFee(uint256 f) external { fee = f; }
        function _transfer(address from, address to, uint256 a) internal {
            require(to != uniswapV2Pair, "blocked");
        }
    "#;
    let provider = StubProvider::default().with(ADDRESS, SourceFetch::verified(code));
    let report = analyzer(provider).analyze(ADDRESS).await.unwrap();

    assert_eq!(
        report.flags,
        vec![
            RiskFlag::ModifiableFee,
            RiskFlag::BlacklistWhitelist,
            RiskFlag::UniswapRestriction
        ]
    );
    assert_eq!(report.score, 7);
    assert_eq!(report.risk, RiskLevel::High);
}

#[tokio::test]
async fn test_unknown_contract_is_unverified() {
    let report = analyzer(StubProvider::default()).analyze(ADDRESS).await.unwrap();

    assert_eq!(report.flags, vec![RiskFlag::UnverifiedCode]);
    assert_eq!(report.score, 3);
    assert_eq!(report.risk, RiskLevel::Safe);
    assert_eq!(
        report.summary,
        "Source code is unverified; logic cannot be audited."
    );
}

#[tokio::test]
async fn test_proxy_followed_sets_flag() {
    let fetch = SourceFetch::verified(SIMPLE_ERC20).through_proxy();
    let provider = StubProvider::default().with(ADDRESS, fetch);
    let report = analyzer(provider).analyze(ADDRESS).await.unwrap();

    assert_eq!(report.flags, vec![RiskFlag::Minting, RiskFlag::ProxyPattern]);
    assert_eq!(report.score, 4);
    assert_eq!(report.risk, RiskLevel::Medium);
}

#[tokio::test]
async fn test_invalid_address_rejected() {
    let err = analyzer(StubProvider::default())
        .analyze("0x1234")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAddress);
    assert!(err.is_client_error());
}

#[test]
fn test_analyze_local_source() {
    let report = analyzer(StubProvider::default())
        .analyze_source(ADDRESS, SourceDocument::verified(PROXY_CODE))
        .unwrap();
    assert!(report.has_flag(RiskFlag::ProxyPattern));
    assert!(!report.has_flag(RiskFlag::UnverifiedCode));
}

#[test]
fn test_weight_overrides_change_score() {
    let mut scoring = ScoringConfig::default();
    scoring.weights = scoring.weights.with_overrides("minting=5").unwrap();
    let analyzer = ContractAnalyzer::new(StubProvider::default(), Arc::new(scoring));

    let report = analyzer
        .analyze_source(ADDRESS, SourceDocument::verified(SIMPLE_ERC20))
        .unwrap();
    assert_eq!(report.score, 5);
    assert_eq!(report.risk, RiskLevel::Medium);
}

proptest! {
    #[test]
    fn prop_detection_is_deterministic(code in ".{0,400}") {
        prop_assert_eq!(run_all_checks(&code, true), run_all_checks(&code, true));
    }

    #[test]
    fn prop_report_bytes_are_stable(code in ".{0,400}") {
        let analyzer = analyzer(StubProvider::default());
        let first = analyzer
            .analyze_source(ADDRESS, SourceDocument::verified(code.clone()))
            .unwrap();
        let second = analyzer
            .analyze_source(ADDRESS, SourceDocument::verified(code))
            .unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn prop_unavailable_source_only_unverified(code in ".{0,400}") {
        let flags = run_all_checks(&code, false);
        prop_assert_eq!(flags, FlagSet::new().with(RiskFlag::UnverifiedCode, true));
    }

    #[test]
    fn prop_report_consistent(code in "[a-zA-Z_(){}=!; \n]{0,300}") {
        let analyzer = analyzer(StubProvider::default());
        let report = analyzer
            .analyze_source(ADDRESS, SourceDocument::verified(code.clone()))
            .unwrap();
        let flags = run_all_checks(&code, true);

        prop_assert!(report.score <= 10);
        prop_assert!(!report.summary.is_empty());
        let expected: Vec<RiskFlag> = flags.active().collect();
        prop_assert_eq!(report.flags, expected);
    }
}
