//! Summary generation and report assembly

use std::collections::HashMap;

use super::risk_score::{classify_risk, compute_score};
use crate::models::{FlagSet, RiskFlag, RiskReport, ScoringConfig};
use crate::utils::constants::BENIGN_SUMMARY;

/// Human-readable sentence per flag, used to build summaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDescriptions {
    descriptions: HashMap<RiskFlag, String>,
}

impl Default for FlagDescriptions {
    fn default() -> Self {
        let descriptions = RiskFlag::ALL
            .iter()
            .map(|flag| (*flag, default_description(*flag).to_string()))
            .collect();
        Self { descriptions }
    }
}

fn default_description(flag: RiskFlag) -> &'static str {
    match flag {
        RiskFlag::ModifiableFee => {
            "Contract allows tax or fee parameters to be modified by privileged accounts."
        }
        RiskFlag::BlacklistWhitelist => {
            "Contract contains blacklist/whitelist or transfer restrictions that can block users."
        }
        RiskFlag::UniswapRestriction => {
            "Contract restricts selling via the liquidity pool (potential honeypot)."
        }
        RiskFlag::OwnerNotRenounced => {
            "Ownership is active and `onlyOwner` functions exist without renunciation."
        }
        RiskFlag::Minting => "Mint function detected; supply can be increased at will.",
        RiskFlag::PauseTrading => "Trading can be paused or resumed by the owner.",
        RiskFlag::UnverifiedCode => "Source code is unverified; logic cannot be audited.",
        RiskFlag::TransferLimits => {
            "Contract imposes maximum transaction or wallet limits, which can restrict users from selling or transferring."
        }
        RiskFlag::ProxyPattern => {
            "Contract uses delegatecall or proxy pattern; logic may be upgraded after deployment."
        }
        RiskFlag::MaxLimitsStrict => {
            "Wallet or transaction limits are set to 2% or less of supply, which can trap holders."
        }
        RiskFlag::DynamicFeesPublic => {
            "Fees are exposed as public variables and can be changed at any time by a setter."
        }
        RiskFlag::TransferTrap => {
            "Transfers are gated on the owner address, so ordinary holders may be unable to move tokens."
        }
    }
}

impl FlagDescriptions {
    /// Build a table from explicit entries; flags left out have no description
    pub fn from_entries<S: Into<String>>(entries: impl IntoIterator<Item = (RiskFlag, S)>) -> Self {
        let descriptions = entries
            .into_iter()
            .map(|(flag, text)| (flag, text.into()))
            .collect();
        Self { descriptions }
    }

    pub fn get(&self, flag: RiskFlag) -> Option<&str> {
        self.descriptions.get(&flag).map(String::as_str)
    }
}

/// Join the descriptions of active flags in catalogue order.
///
/// Active flags without a description contribute their identifier, so a
/// risky report never carries the benign message.
pub fn generate_summary(flags: &FlagSet, descriptions: &FlagDescriptions) -> String {
    let parts: Vec<&str> = flags
        .active()
        .map(|flag| {
            descriptions
                .get(flag)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or(flag.as_str())
        })
        .collect();

    if parts.is_empty() {
        BENIGN_SUMMARY.to_string()
    } else {
        parts.join(" ")
    }
}

/// Score, classify and summarize a flag set. The address is echoed unchanged.
pub fn build_report(address: &str, flags: &FlagSet, scoring: &ScoringConfig) -> RiskReport {
    let score = compute_score(flags, &scoring.weights);

    RiskReport {
        address: address.to_string(),
        score,
        risk: classify_risk(score),
        flags: flags.active().collect(),
        summary: generate_summary(flags, &scoring.descriptions),
    }
}
