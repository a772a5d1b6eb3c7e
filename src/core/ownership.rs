//! Owner / renouncement detection
//!
//! Two signals: does the contract expose owner-only controls, and does it
//! show evidence that ownership was (or can be) given up. Renouncement wins.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OWNER_CONTROL_RE: Option<Regex> =
        Regex::new(r"(?i)\b(?:onlyOwner|owner\s*\()").ok();
    static ref RENOUNCE_RE: Option<Regex> = Regex::new(r"(?i)\brenounceOwnership\s*\(").ok();
    static ref ZERO_OWNER_TRANSFER_RE: Option<Regex> =
        Regex::new(r"(?i)transferOwnership\s*\(\s*address\s*\(\s*0\s*\)\s*\)").ok();
}

fn found(re: &Option<Regex>, code: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(code))
}

/// Evidence gathered from one source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnershipEvidence {
    /// `onlyOwner` modifier or `owner(` call present
    pub has_owner_controls: bool,
    /// `renounceOwnership(` or `transferOwnership(address(0))` present
    pub renounced: bool,
}

impl OwnershipEvidence {
    pub fn collect(code: &str) -> Self {
        Self {
            has_owner_controls: found(&OWNER_CONTROL_RE, code),
            renounced: found(&RENOUNCE_RE, code) || found(&ZERO_OWNER_TRANSFER_RE, code),
        }
    }

    /// Owner controls exist and nothing suggests they were given up
    pub fn is_risky(&self) -> bool {
        self.has_owner_controls && !self.renounced
    }
}

/// `owner_not_renounced` detector. Always false without source.
pub fn check_owner_not_renounced(code: &str, source_available: bool) -> bool {
    if !source_available {
        return false;
    }
    OwnershipEvidence::collect(code).is_risky()
}
