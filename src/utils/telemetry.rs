//! Telemetry Module
//!
//! In-process counters for served analyses: totals per risk tier, how often
//! source was missing, how often a proxy was followed, and latency.
//!
//! Privacy-first: no contract addresses or API keys are stored.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::Analysis;
use crate::models::RiskLevel;

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScanStats {
    pub total_analyzed: u64,
    pub safe: u64,
    pub medium: u64,
    pub high: u64,
    /// Analyses that ran without source
    pub unverified: u64,
    /// Analyses that went through at least one proxy hop
    pub proxies_followed: u64,
    /// Requests rejected before analysis (bad address, unknown chain)
    pub rejected: u64,
    pub avg_latency_ms: f64,
    /// Collector start (unix seconds)
    pub since: u64,
}

impl ScanStats {
    /// Plain-text summary for logs
    pub fn summary(&self) -> String {
        format!(
            r#"
╔══════════════════════════════════════════════╗
║        🍯 HONEYPOT SCANNER - SCAN REPORT     ║
╠══════════════════════════════════════════════╣
║   🔍 Contracts Analyzed:   {:>10}          ║
║   ✅ Safe:                 {:>10}          ║
║   🟠 Medium:               {:>10}          ║
║   🔴 High:                 {:>10}          ║
║   📄 Unverified Source:    {:>10}          ║
║   🔀 Proxies Followed:     {:>10}          ║
║   ⚡ Avg Latency:          {:>10.2}ms        ║
╚══════════════════════════════════════════════╝
"#,
            self.total_analyzed,
            self.safe,
            self.medium,
            self.high,
            self.unverified,
            self.proxies_followed,
            self.avg_latency_ms,
        )
    }
}

/// Lock-free scan counters, shared through `Arc`
#[derive(Debug)]
pub struct ScanTelemetry {
    safe: AtomicU64,
    medium: AtomicU64,
    high: AtomicU64,
    unverified: AtomicU64,
    proxies_followed: AtomicU64,
    rejected: AtomicU64,
    total_latency_ms: AtomicU64,
    since: u64,
}

impl Default for ScanTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanTelemetry {
    pub fn new() -> Self {
        Self {
            safe: AtomicU64::new(0),
            medium: AtomicU64::new(0),
            high: AtomicU64::new(0),
            unverified: AtomicU64::new(0),
            proxies_followed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            since: current_timestamp(),
        }
    }

    /// Record one completed analysis
    pub fn record(&self, analysis: &Analysis) {
        let tier = match analysis.report.risk {
            RiskLevel::Safe => &self.safe,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
        };
        tier.fetch_add(1, Ordering::Relaxed);

        if !analysis.source_available {
            self.unverified.fetch_add(1, Ordering::Relaxed);
        }
        if analysis.followed_proxy {
            self.proxies_followed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms
            .fetch_add(analysis.latency_ms, Ordering::Relaxed);
    }

    /// Record a request rejected by validation
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScanStats {
        let safe = self.safe.load(Ordering::Relaxed);
        let medium = self.medium.load(Ordering::Relaxed);
        let high = self.high.load(Ordering::Relaxed);
        let total = safe + medium + high;
        let latency = self.total_latency_ms.load(Ordering::Relaxed);

        ScanStats {
            total_analyzed: total,
            safe,
            medium,
            high,
            unverified: self.unverified.load(Ordering::Relaxed),
            proxies_followed: self.proxies_followed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                latency as f64 / total as f64
            } else {
                0.0
            },
            since: self.since,
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskFlag, RiskReport};

    fn analysis(risk: RiskLevel, available: bool, proxy: bool, latency_ms: u64) -> Analysis {
        Analysis {
            report: RiskReport {
                address: "0x0000000000000000000000000000000000000001".to_string(),
                score: 0,
                risk,
                flags: vec![RiskFlag::UnverifiedCode],
                summary: String::new(),
            },
            source_available: available,
            followed_proxy: proxy,
            latency_ms,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let stats = ScanTelemetry::new().snapshot();
        assert_eq!(stats.total_analyzed, 0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_counters() {
        let telemetry = ScanTelemetry::new();
        telemetry.record(&analysis(RiskLevel::Safe, false, false, 10));
        telemetry.record(&analysis(RiskLevel::High, true, true, 30));
        telemetry.record(&analysis(RiskLevel::High, true, false, 20));
        telemetry.record_rejected();

        let stats = telemetry.snapshot();
        assert_eq!(stats.total_analyzed, 3);
        assert_eq!(stats.safe, 1);
        assert_eq!(stats.medium, 0);
        assert_eq!(stats.high, 2);
        assert_eq!(stats.unverified, 1);
        assert_eq!(stats.proxies_followed, 1);
        assert_eq!(stats.rejected, 1);
        assert!((stats.avg_latency_ms - 20.0).abs() < f64::EPSILON);
        assert!(stats.summary().contains("SCAN REPORT"));
    }
}
