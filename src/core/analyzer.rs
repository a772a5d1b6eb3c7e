//! Core analyzer module
//! Orchestrates the analysis pipeline: validate → fetch → detect → score → report

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::detectors::scan_document;
use super::report::build_report;
use crate::models::{AppError, AppResult, RiskFlag, RiskReport, ScoringConfig, SourceDocument};
use crate::providers::{SourceFetch, SourceProvider};

/// Check `0x` + 40 hex digits (either case) and return the trimmed address
pub fn validate_address(address: &str) -> AppResult<&str> {
    let trimmed = address.trim();
    let valid = trimmed
        .strip_prefix("0x")
        .filter(|digits| digits.len() == 40)
        .is_some_and(|digits| hex::decode(digits).is_ok());

    if valid {
        Ok(trimmed)
    } else {
        Err(AppError::invalid_address(trimmed))
    }
}

/// Report plus retrieval facts the caller may want to record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub report: RiskReport,
    pub source_available: bool,
    pub followed_proxy: bool,
    pub latency_ms: u64,
}

/// Main analyzer: one provider, one shared scoring configuration
pub struct ContractAnalyzer<P: SourceProvider> {
    provider: P,
    scoring: Arc<ScoringConfig>,
}

impl<P: SourceProvider> ContractAnalyzer<P> {
    pub fn new(provider: P, scoring: Arc<ScoringConfig>) -> Self {
        Self { provider, scoring }
    }

    /// Fetch and analyze a contract.
    ///
    /// Only an invalid address is an error. Retrieval problems produce an
    /// `unverified_code` report.
    pub async fn analyze(&self, address: &str) -> AppResult<RiskReport> {
        self.analyze_detailed(address).await.map(|a| a.report)
    }

    pub async fn analyze_detailed(&self, address: &str) -> AppResult<Analysis> {
        let start = Instant::now();
        let address = validate_address(address)?;

        let fetch = match self.provider.fetch_source(address).await {
            Ok(fetch) => fetch,
            Err(e) => {
                warn!(
                    code = e.code_str(),
                    "⚠️ {} failed for {}: {}",
                    self.provider.name(),
                    address,
                    e
                );
                SourceFetch::unavailable()
            }
        };

        let source_available = fetch.document.is_available();
        let followed_proxy = fetch.followed_proxy;
        let report = self.report_for(address, &fetch);
        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            "🔍 {} → {} (score {}/10, {} flags, {}ms)",
            address,
            report.risk,
            report.score,
            report.flags.len(),
            latency_ms
        );

        Ok(Analysis {
            report,
            source_available,
            followed_proxy,
            latency_ms,
        })
    }

    /// Analyze source the caller already holds (no retrieval)
    pub fn analyze_source(&self, address: &str, document: SourceDocument) -> AppResult<RiskReport> {
        let address = validate_address(address)?;
        let fetch = SourceFetch {
            document,
            followed_proxy: false,
        };
        Ok(self.report_for(address, &fetch))
    }

    fn report_for(&self, address: &str, fetch: &SourceFetch) -> RiskReport {
        let mut flags = scan_document(&fetch.document);
        if fetch.followed_proxy {
            debug!("Proxy followed for {}, forcing proxy_pattern", address);
            flags.set(RiskFlag::ProxyPattern, true);
        }
        build_report(address, &flags, &self.scoring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorCode, RiskLevel};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    const ADDRESS: &str = "0x1234567890abcdef1234567890ABCDEF12345678";

    struct FixedProvider(AppResult<SourceFetch>);

    #[async_trait]
    impl SourceProvider for FixedProvider {
        async fn fetch_source(&self, _address: &str) -> AppResult<SourceFetch> {
            match &self.0 {
                Ok(fetch) => Ok(fetch.clone()),
                Err(e) => Err(AppError::new(e.code, e.message.clone())),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn analyzer(result: AppResult<SourceFetch>) -> ContractAnalyzer<FixedProvider> {
        ContractAnalyzer::new(FixedProvider(result), Arc::new(ScoringConfig::default()))
    }

    #[test]
    fn test_validate_address() {
        assert_eq!(validate_address(ADDRESS).unwrap(), ADDRESS);
        assert_eq!(validate_address(&format!("  {}\n", ADDRESS)).unwrap(), ADDRESS);

        for bad in [
            "",
            "0x",
            "1234567890abcdef1234567890abcdef12345678",
            "0x1234567890abcdef1234567890abcdef1234567",
            "0x1234567890abcdef1234567890abcdef123456789",
            "0x1234567890abcdef1234567890abcdef1234567g",
            "0X1234567890abcdef1234567890abcdef12345678",
        ] {
            let err = validate_address(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidAddress, "{:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_invalid_address_never_fetches() {
        let analyzer = analyzer(Err(AppError::internal("must not be called")));
        let err = analyzer.analyze("0xnope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);
    }

    #[tokio::test]
    async fn test_provider_error_is_unverified() {
        let analyzer = analyzer(Err(AppError::explorer(ErrorCode::ExplorerTimeout, "slow")));
        let report = analyzer.analyze(ADDRESS).await.unwrap();

        assert_eq!(report.flags, vec![RiskFlag::UnverifiedCode]);
        assert_eq!(report.score, 3);
        assert_eq!(report.risk, RiskLevel::Safe);
    }

    #[tokio::test]
    async fn test_followed_proxy_merges_flag() {
        let fetch = SourceFetch::verified("contract Impl { function transfer() public {} }")
            .through_proxy();
        let analysis = analyzer(Ok(fetch)).analyze_detailed(ADDRESS).await.unwrap();

        assert!(analysis.followed_proxy);
        assert!(analysis.source_available);
        assert_eq!(analysis.report.flags, vec![RiskFlag::ProxyPattern]);
        assert_eq!(analysis.report.score, 2);
    }

    #[tokio::test]
    async fn test_unavailable_after_proxy() {
        let analysis = analyzer(Ok(SourceFetch::unavailable().through_proxy()))
            .analyze_detailed(ADDRESS)
            .await
            .unwrap();

        assert_eq!(
            analysis.report.flags,
            vec![RiskFlag::UnverifiedCode, RiskFlag::ProxyPattern]
        );
        assert_eq!(analysis.report.score, 5);
        assert_eq!(analysis.report.risk, RiskLevel::Medium);
    }

    #[test]
    fn test_analyze_source() {
        let analyzer = analyzer(Ok(SourceFetch::unavailable()));
        let report = analyzer
            .analyze_source(ADDRESS, SourceDocument::verified("contract Plain { uint256 x; }"))
            .unwrap();

        assert_eq!(report.address, ADDRESS);
        assert_eq!(report.score, 0);
        assert_eq!(report.risk, RiskLevel::Safe);
        assert!(report.flags.is_empty());
        assert_eq!(report.summary, crate::utils::constants::BENIGN_SUMMARY);
    }
}
