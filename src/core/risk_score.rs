//! Risk Scoring Module
//! Weighted 0-10 score over the active flags, and the 3-tier classifier
//!
//! - 0-3: SAFE
//! - 4-6: MEDIUM
//! - 7-10: HIGH

use std::collections::HashMap;

use crate::models::{AppError, AppResult, FlagSet, RiskFlag, RiskLevel};
use crate::utils::constants::{DEFAULT_FLAG_WEIGHT, MAX_SCORE};

/// Per-flag weight table.
///
/// Built once at start-up and shared read-only. Every weight is a positive
/// integer, so adding an active flag never lowers the score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagWeights {
    weights: HashMap<RiskFlag, u8>,
}

impl Default for FlagWeights {
    fn default() -> Self {
        Self::from_entries([
            (RiskFlag::ModifiableFee, 2),
            (RiskFlag::BlacklistWhitelist, 2),
            (RiskFlag::UniswapRestriction, 3),
            (RiskFlag::OwnerNotRenounced, 1),
            (RiskFlag::Minting, 2),
            (RiskFlag::PauseTrading, 1),
            (RiskFlag::UnverifiedCode, 3),
            (RiskFlag::TransferLimits, 2),
            (RiskFlag::ProxyPattern, 2),
            (RiskFlag::MaxLimitsStrict, 1),
            (RiskFlag::DynamicFeesPublic, 1),
            (RiskFlag::TransferTrap, 1),
        ])
    }
}

impl FlagWeights {
    /// Build a table from explicit entries. Zero weights are raised to 1.
    pub fn from_entries(entries: impl IntoIterator<Item = (RiskFlag, u8)>) -> Self {
        let weights = entries
            .into_iter()
            .map(|(flag, weight)| (flag, weight.max(1)))
            .collect();
        Self { weights }
    }

    /// Weight of a flag; flags missing from the table weigh `DEFAULT_FLAG_WEIGHT`
    pub fn weight(&self, flag: RiskFlag) -> u8 {
        self.weights
            .get(&flag)
            .copied()
            .unwrap_or(DEFAULT_FLAG_WEIGHT)
    }

    /// Apply `name=weight` overrides separated by commas.
    ///
    /// Unknown flag names and weights outside `1..=MAX_SCORE` are rejected
    /// with `CFG_INVALID_VALUE`.
    pub fn with_overrides(&self, overrides: &str) -> AppResult<Self> {
        let mut weights = self.weights.clone();

        for entry in overrides.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, value) = entry.split_once('=').ok_or_else(|| {
                AppError::invalid_config(format!("Expected name=weight, got {:?}", entry))
            })?;

            let flag = RiskFlag::from_name(name).ok_or_else(|| {
                AppError::invalid_config(format!(
                    "Unknown flag in weight override: {}",
                    name.trim()
                ))
            })?;

            let weight = value
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|w| (1..=MAX_SCORE).contains(w))
                .ok_or_else(|| {
                    AppError::invalid_config(format!(
                        "Weight for {} must be an integer in 1..={}, got {:?}",
                        flag,
                        MAX_SCORE,
                        value.trim()
                    ))
                })?;

            weights.insert(flag, weight);
        }

        Ok(Self { weights })
    }
}

/// Sum the weights of all active flags, capped at `MAX_SCORE`
pub fn compute_score(flags: &FlagSet, weights: &FlagWeights) -> u8 {
    let total: u32 = flags
        .active()
        .map(|flag| u32::from(weights.weight(flag)))
        .sum();

    total.min(u32::from(MAX_SCORE)) as u8
}

/// Map a score to its tier. Scores above 10 are HIGH.
pub fn classify_risk(score: u8) -> RiskLevel {
    match score {
        0..=3 => RiskLevel::Safe,
        4..=6 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}
