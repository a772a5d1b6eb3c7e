//! Risk flag catalogue
//!
//! Closed set of flag identifiers produced by the detector set, and the
//! fixed-key `FlagSet` that carries one boolean per flag through the
//! scoring pipeline.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Named boolean risk indicator produced by exactly one detector.
///
/// Declaration order is the catalogue order: reports list active flags and
/// summaries concatenate descriptions in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    /// Tax/fee setters present
    ModifiableFee,
    /// Blacklist/whitelist/ban identifiers
    BlacklistWhitelist,
    /// Transfers to the AMM pair are guarded
    UniswapRestriction,
    /// Owner controls present and ownership not renounced
    OwnerNotRenounced,
    /// Mint primitive or public mint function
    Minting,
    /// Pausable guards or trading toggles
    PauseTrading,
    /// No verified source available
    UnverifiedCode,
    /// Max-transaction / max-wallet limits
    TransferLimits,
    /// delegatecall or proxy markers
    ProxyPattern,
    /// Percent-style limit set to 2 or less
    MaxLimitsStrict,
    /// Public fee variable alongside a fee setter
    DynamicFeesPublic,
    /// Transfer guarded on the owner address
    TransferTrap,
}

impl RiskFlag {
    /// Number of flags in the catalogue
    pub const COUNT: usize = 12;

    /// Every flag, in catalogue order
    pub const ALL: [RiskFlag; RiskFlag::COUNT] = [
        RiskFlag::ModifiableFee,
        RiskFlag::BlacklistWhitelist,
        RiskFlag::UniswapRestriction,
        RiskFlag::OwnerNotRenounced,
        RiskFlag::Minting,
        RiskFlag::PauseTrading,
        RiskFlag::UnverifiedCode,
        RiskFlag::TransferLimits,
        RiskFlag::ProxyPattern,
        RiskFlag::MaxLimitsStrict,
        RiskFlag::DynamicFeesPublic,
        RiskFlag::TransferTrap,
    ];

    /// Wire name of the flag (as it appears in reports)
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::ModifiableFee => "modifiable_fee",
            RiskFlag::BlacklistWhitelist => "blacklist_whitelist",
            RiskFlag::UniswapRestriction => "uniswap_restriction",
            RiskFlag::OwnerNotRenounced => "owner_not_renounced",
            RiskFlag::Minting => "minting",
            RiskFlag::PauseTrading => "pause_trading",
            RiskFlag::UnverifiedCode => "unverified_code",
            RiskFlag::TransferLimits => "transfer_limits",
            RiskFlag::ProxyPattern => "proxy_pattern",
            RiskFlag::MaxLimitsStrict => "max_limits_strict",
            RiskFlag::DynamicFeesPublic => "dynamic_fees_public",
            RiskFlag::TransferTrap => "transfer_trap",
        }
    }

    /// Look up a flag by wire name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|flag| flag.as_str().eq_ignore_ascii_case(name))
    }

    /// Position in the catalogue
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One boolean per catalogue flag.
///
/// Keys cannot be missing or duplicated: the set is a fixed array indexed by
/// `RiskFlag`, so every flag always has exactly one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagSet {
    values: [bool; RiskFlag::COUNT],
}

impl FlagSet {
    /// All flags false
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, flag: RiskFlag) -> bool {
        self.values[flag.index()]
    }

    pub fn set(&mut self, flag: RiskFlag, value: bool) {
        self.values[flag.index()] = value;
    }

    /// Builder-style `set`
    pub fn with(mut self, flag: RiskFlag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Every (flag, value) pair in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = (RiskFlag, bool)> + '_ {
        RiskFlag::ALL.iter().map(move |flag| (*flag, self.get(*flag)))
    }

    /// Flags set to true, in catalogue order
    pub fn active(&self) -> impl Iterator<Item = RiskFlag> + '_ {
        self.iter().filter(|(_, value)| *value).map(|(flag, _)| flag)
    }

    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|v| **v).count()
    }

    pub fn any(&self) -> bool {
        self.values.iter().any(|v| *v)
    }
}

impl FromIterator<(RiskFlag, bool)> for FlagSet {
    fn from_iter<I: IntoIterator<Item = (RiskFlag, bool)>>(iter: I) -> Self {
        let mut flags = FlagSet::new();
        for (flag, value) in iter {
            flags.set(flag, value);
        }
        flags
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(RiskFlag::COUNT))?;
        for (flag, value) in self.iter() {
            map.serialize_entry(flag.as_str(), &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_complete_and_ordered() {
        assert_eq!(RiskFlag::ALL.len(), RiskFlag::COUNT);
        for (i, flag) in RiskFlag::ALL.iter().enumerate() {
            assert_eq!(flag.index(), i);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(RiskFlag::from_name("minting"), Some(RiskFlag::Minting));
        assert_eq!(
            RiskFlag::from_name(" Owner_Not_Renounced "),
            Some(RiskFlag::OwnerNotRenounced)
        );
        assert_eq!(RiskFlag::from_name("rug_pull"), None);
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        for flag in RiskFlag::ALL {
            let json = serde_json::to_string(&flag).unwrap();
            assert_eq!(json, format!("\"{}\"", flag.as_str()));
        }
    }

    #[test]
    fn test_active_in_catalogue_order() {
        let flags = FlagSet::new()
            .with(RiskFlag::TransferTrap, true)
            .with(RiskFlag::ModifiableFee, true)
            .with(RiskFlag::ProxyPattern, true);

        let active: Vec<RiskFlag> = flags.active().collect();
        assert_eq!(
            active,
            vec![
                RiskFlag::ModifiableFee,
                RiskFlag::ProxyPattern,
                RiskFlag::TransferTrap
            ]
        );
        assert_eq!(flags.active_count(), 3);
    }

    #[test]
    fn test_set_overwrites_single_entry() {
        let mut flags = FlagSet::new();
        flags.set(RiskFlag::Minting, true);
        flags.set(RiskFlag::Minting, false);
        assert!(!flags.any());
        assert_eq!(flags.iter().count(), RiskFlag::COUNT);
    }

    #[test]
    fn test_serialize_as_map() {
        let flags = FlagSet::new().with(RiskFlag::Minting, true);
        let value = serde_json::to_value(flags).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), RiskFlag::COUNT);
        assert_eq!(map["minting"], true);
        assert_eq!(map["proxy_pattern"], false);
    }
}
