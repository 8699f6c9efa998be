//! Firewall chain identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FirewallError;

/// A named rule set that can be enabled or disabled independently.
///
/// The numeric values are opaque wire identifiers, not priorities.
/// Evaluation order is configured separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallChain {
    /// Restrictions applied while on a metered network.
    Metered,
    /// Restrictions applied while the device is idle.
    Dozable,
    /// Restrictions applied to apps in background standby.
    Standby,
}

impl FirewallChain {
    /// Number of recognized chains.
    pub const COUNT: usize = 3;

    /// Every recognized chain, in wire-value order.
    pub const ALL: [FirewallChain; Self::COUNT] = [
        FirewallChain::Metered,
        FirewallChain::Dozable,
        FirewallChain::Standby,
    ];

    /// Wire value.
    pub fn as_raw(self) -> i32 {
        match self {
            FirewallChain::Metered => 1,
            FirewallChain::Dozable => 2,
            FirewallChain::Standby => 3,
        }
    }

    /// Dense slot index in `0..COUNT`, used for fixed-size per-chain tables.
    pub fn index(self) -> usize {
        match self {
            FirewallChain::Metered => 0,
            FirewallChain::Dozable => 1,
            FirewallChain::Standby => 2,
        }
    }

    /// Lowercase name used in config files, logs, and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            FirewallChain::Metered => "metered",
            FirewallChain::Dozable => "dozable",
            FirewallChain::Standby => "standby",
        }
    }
}

impl TryFrom<i32> for FirewallChain {
    type Error = FirewallError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(FirewallChain::Metered),
            2 => Ok(FirewallChain::Dozable),
            3 => Ok(FirewallChain::Standby),
            other => Err(FirewallError::InvalidChain(other)),
        }
    }
}

impl fmt::Display for FirewallChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_match_wire_contract() {
        assert_eq!(FirewallChain::try_from(1), Ok(FirewallChain::Metered));
        assert_eq!(FirewallChain::try_from(2), Ok(FirewallChain::Dozable));
        assert_eq!(FirewallChain::try_from(3), Ok(FirewallChain::Standby));
        for c in FirewallChain::ALL {
            assert_eq!(FirewallChain::try_from(c.as_raw()), Ok(c));
        }
    }

    #[test]
    fn unknown_raw_is_invalid_chain() {
        assert_eq!(FirewallChain::try_from(0), Err(FirewallError::InvalidChain(0)));
        assert_eq!(FirewallChain::try_from(-3), Err(FirewallError::InvalidChain(-3)));
        assert_eq!(FirewallChain::try_from(4), Err(FirewallError::InvalidChain(4)));
    }

    #[test]
    fn indices_are_dense() {
        let mut seen = [false; FirewallChain::COUNT];
        for c in FirewallChain::ALL {
            assert!(!seen[c.index()]);
            seen[c.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
