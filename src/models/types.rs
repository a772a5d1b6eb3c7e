//! Type definitions for the honeypot scanner
//! Source documents, risk tiers and the final report

use serde::{Deserialize, Serialize};
use std::fmt;

use super::flags::RiskFlag;

/// Contract source as handed over by the retrieval layer.
///
/// `available == false` means no verified source could be obtained (the
/// contract is unverified, or the fetch failed). Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceDocument {
    text: String,
    available: bool,
}

impl SourceDocument {
    /// Source that was actually retrieved
    pub fn verified(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            available: true,
        }
    }

    /// No source: unverified contract or failed retrieval
    pub fn unavailable() -> Self {
        Self {
            text: String::new(),
            available: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

/// Qualitative risk tier derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Score 0-3
    Safe,
    /// Score 4-6
    Medium,
    /// Score 7-10
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final analysis artifact returned to the HTTP and CLI layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Contract address, as validated by the caller
    pub address: String,
    /// Weighted score, 0-10
    pub score: u8,
    /// Tier derived from `score`
    pub risk: RiskLevel,
    /// Active flags in catalogue order
    pub flags: Vec<RiskFlag>,
    /// Human-readable explanation
    pub summary: String,
}

impl RiskReport {
    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.flags.contains(&flag)
    }
}
