//! Detector Set
//!
//! Lexical heuristics over contract source. Each detector answers one
//! question ("does this text look like it can do X?") with a boolean, using
//! substring or regex matches on a normalized copy of the source:
//!
//! - `lower`: lowercased text
//! - `compact`: lowercased with spaces, tabs and line breaks removed, so
//!   `require( to != uniswapPair )` and `require(to!=uniswapPair)` look alike
//!
//! Detectors never fail. A pattern that cannot be compiled or a number that
//! cannot be parsed counts as "no evidence".

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::ownership::check_owner_not_renounced;
use crate::models::{FlagSet, RiskFlag, SourceDocument};

// ============================================
// Pattern tables
// ============================================

const FEE_SETTERS: [&str; 7] = [
    "settax",
    "setfee",
    "setfees",
    "updatetax",
    "buyfee",
    "sellfee",
    "changetax",
];

const ACCESS_LISTS: [&str; 7] = [
    "blacklist",
    "whitelist",
    "blocklist",
    "banuser",
    "setmaxtx",
    "maxwallet",
    "removeliquidity",
];

const AMM_PAIR_GUARDS: [&str; 3] = [
    "require(to!=uniswap",
    "to!=uniswappair",
    "to!=uniswapv2pair",
];

const PAUSABLE_GUARDS: [&str; 4] = ["whennotpaused", "whenpaused", "paused()", "pausable"];

const TRADING_TOGGLES: [&str; 5] = [
    "pausetrading",
    "settrading",
    "enabletrading",
    "tradingopen",
    "opentrading",
];

const LIMIT_IDENTIFIERS: [&str; 8] = [
    "setmaxtx",
    "maxtx",
    "maxwallet",
    "maxwalletsize",
    "maxsell",
    "maxbuy",
    "maxtransactionamount",
    "maxtransaction",
];

const PROXY_MARKERS: [&str; 4] = ["delegatecall(", "eip1967", "implementation", "proxy"];

/// Setters that make a public fee variable "dynamic"
const FEE_MUTATORS: [&str; 4] = ["setfee", "setfees", "settax", "updatetax"];

const OWNER_TRANSFER_GUARDS: [&str; 8] = [
    "require(from!=owner",
    "require(_from!=owner",
    "require(to!=owner",
    "require(_to!=owner",
    "require(from==owner",
    "require(_from==owner",
    "require(to==owner",
    "require(_to==owner",
];

/// Highest percent value that still counts as a strict limit
const STRICT_LIMIT_PERCENT: u16 = 2;

lazy_static! {
    /// `require(to != somethingPair, ...)` with arbitrary pair naming
    static ref PAIR_GUARD_RE: Option<Regex> =
        Regex::new(r"(?i)require\s*\(\s*(?:_?to|_?recipient)\s*!=\s*([a-zA-Z_]\w*)\s*[,)]").ok();

    /// `maxWalletPercent = 1` (applied to lowercased text)
    static ref MAX_PERCENT_RE: Option<Regex> =
        Regex::new(r"max\w*percent\s*=\s*(\d{1,3})\b").ok();

    /// Same identifier, value assigned further along the statement
    static ref MAX_PERCENT_LATE_ASSIGN_RE: Option<Regex> =
        Regex::new(r"(max\w*percent)[^;]{0,80}=\s*[12]\b").ok();

    /// `uint256 public sellFee` style state variable (applied to lowercased text)
    static ref PUBLIC_FEE_VAR_RE: Option<Regex> =
        Regex::new(r"\bu?int\d{0,3}\s+public\s+\w*(?:fee|tax)\w*").ok();
}

// ============================================
// Normalization
// ============================================

/// Source text plus the normalized views the detectors match against
#[derive(Debug, Clone)]
pub struct ScanText<'a> {
    raw: &'a str,
    lower: String,
    compact: String,
}

impl<'a> ScanText<'a> {
    pub fn new(raw: &'a str) -> Self {
        let lower = raw.to_lowercase();
        let compact = lower
            .chars()
            .filter(|c| !matches!(c, ' ' | '\n' | '\r' | '\t'))
            .collect();
        Self { raw, lower, compact }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn compact(&self) -> &str {
        &self.compact
    }
}

#[inline]
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[inline]
fn is_match(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

// ============================================
// Detectors
// ============================================

pub fn check_modifiable_fee(text: &ScanText) -> bool {
    contains_any(text.lower(), &FEE_SETTERS)
}

pub fn check_blacklist_whitelist(text: &ScanText) -> bool {
    contains_any(text.lower(), &ACCESS_LISTS)
}

/// Sell restriction towards the AMM pair: either a known literal guard or a
/// `require(to != <anything containing "pair">)` guard.
pub fn check_uniswap_restriction(text: &ScanText) -> bool {
    if contains_any(text.compact(), &AMM_PAIR_GUARDS) {
        return true;
    }

    let Some(re) = PAIR_GUARD_RE.as_ref() else {
        return false;
    };
    re.captures_iter(text.raw())
        .filter_map(|caps| caps.get(1))
        .any(|ident| ident.as_str().to_lowercase().contains("pair"))
}

pub fn check_minting(text: &ScanText) -> bool {
    text.lower().contains("_mint(") || text.lower().contains("function mint")
}

pub fn check_pause_trading(text: &ScanText) -> bool {
    contains_any(text.lower(), &PAUSABLE_GUARDS) || contains_any(text.lower(), &TRADING_TOGGLES)
}

/// True when there is nothing to audit
pub fn check_unverified_code(source: &str, source_available: bool) -> bool {
    !source_available || source.trim().is_empty()
}

pub fn check_transfer_limits(text: &ScanText) -> bool {
    contains_any(text.lower(), &LIMIT_IDENTIFIERS)
}

pub fn check_proxy_pattern(text: &ScanText) -> bool {
    contains_any(text.compact(), &PROXY_MARKERS)
}

/// A `max...percent` limit pinned at 2% or lower.
pub fn check_max_limits_strict(text: &ScanText) -> bool {
    let s = text.lower();

    if let Some(re) = MAX_PERCENT_RE.as_ref() {
        let strict = re
            .captures_iter(s)
            .filter_map(|caps| caps.get(1))
            .filter_map(|value| value.as_str().parse::<u16>().ok())
            .any(|percent| percent <= STRICT_LIMIT_PERCENT);
        if strict {
            return true;
        }
    }

    (s.contains("maxwalletpercent") || s.contains("maxtxpercent"))
        && is_match(&MAX_PERCENT_LATE_ASSIGN_RE, s)
}

/// Publicly readable fee variable that a setter can change.
pub fn check_dynamic_fees_public(text: &ScanText) -> bool {
    is_match(&PUBLIC_FEE_VAR_RE, text.lower()) && contains_any(text.lower(), &FEE_MUTATORS)
}

/// Transfers gated on the sender/recipient being (or not being) the owner.
pub fn check_transfer_trap(text: &ScanText) -> bool {
    contains_any(text.compact(), &OWNER_TRANSFER_GUARDS)
}

// ============================================
// Dispatcher
// ============================================

/// Run the detector for one flag against available source
fn detect(flag: RiskFlag, text: &ScanText) -> bool {
    match flag {
        RiskFlag::ModifiableFee => check_modifiable_fee(text),
        RiskFlag::BlacklistWhitelist => check_blacklist_whitelist(text),
        RiskFlag::UniswapRestriction => check_uniswap_restriction(text),
        RiskFlag::OwnerNotRenounced => check_owner_not_renounced(text.raw(), true),
        RiskFlag::Minting => check_minting(text),
        RiskFlag::PauseTrading => check_pause_trading(text),
        RiskFlag::UnverifiedCode => check_unverified_code(text.raw(), true),
        RiskFlag::TransferLimits => check_transfer_limits(text),
        RiskFlag::ProxyPattern => check_proxy_pattern(text),
        RiskFlag::MaxLimitsStrict => check_max_limits_strict(text),
        RiskFlag::DynamicFeesPublic => check_dynamic_fees_public(text),
        RiskFlag::TransferTrap => check_transfer_trap(text),
    }
}

/// Run every detector once.
///
/// With `source_available == false` the text is ignored: only
/// `unverified_code` is set.
pub fn run_all_checks(code: &str, source_available: bool) -> FlagSet {
    if !source_available {
        return FlagSet::new().with(RiskFlag::UnverifiedCode, true);
    }

    let text = ScanText::new(code);
    let flags: FlagSet = RiskFlag::ALL
        .iter()
        .map(|flag| (*flag, detect(*flag, &text)))
        .collect();

    debug!(
        active = flags.active_count(),
        source_len = code.len(),
        "Detectors finished"
    );
    flags
}

/// `run_all_checks` over a retrieved document
pub fn scan_document(document: &SourceDocument) -> FlagSet {
    run_all_checks(document.text(), document.is_available())
}
