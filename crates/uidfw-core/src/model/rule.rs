//! Per-UID rules and effective verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FirewallError;

/// A UID's stored policy within one chain.
///
/// `Default` means "no explicit entry"; chains never store it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallRule {
    /// Defer to the next chain (or the global default).
    #[default]
    Default,
    Allow,
    Deny,
}

impl FirewallRule {
    /// Wire value.
    pub fn as_raw(self) -> i32 {
        match self {
            FirewallRule::Default => 0,
            FirewallRule::Allow => 1,
            FirewallRule::Deny => 2,
        }
    }

    /// The verdict this rule forces, or `None` for `Default`.
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            FirewallRule::Default => None,
            FirewallRule::Allow => Some(Verdict::Allow),
            FirewallRule::Deny => Some(Verdict::Deny),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FirewallRule::Default => "default",
            FirewallRule::Allow => "allow",
            FirewallRule::Deny => "deny",
        }
    }
}

impl TryFrom<i32> for FirewallRule {
    type Error = FirewallError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(FirewallRule::Default),
            1 => Ok(FirewallRule::Allow),
            2 => Ok(FirewallRule::Deny),
            other => Err(FirewallError::InvalidRule(other)),
        }
    }
}

impl fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final access decision after cross-chain evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Deny => "deny",
        }
    }
}

impl From<Verdict> for FirewallRule {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Allow => FirewallRule::Allow,
            Verdict::Deny => FirewallRule::Deny,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_three_rule_values() {
        assert_eq!(FirewallRule::try_from(0), Ok(FirewallRule::Default));
        assert_eq!(FirewallRule::try_from(1), Ok(FirewallRule::Allow));
        assert_eq!(FirewallRule::try_from(2), Ok(FirewallRule::Deny));
        assert_eq!(FirewallRule::try_from(3), Err(FirewallError::InvalidRule(3)));
        assert_eq!(FirewallRule::try_from(99), Err(FirewallError::InvalidRule(99)));
        assert_eq!(FirewallRule::try_from(-1), Err(FirewallError::InvalidRule(-1)));
    }

    #[test]
    fn default_is_not_decisive() {
        assert_eq!(FirewallRule::Default.verdict(), None);
        assert_eq!(FirewallRule::Allow.verdict(), Some(Verdict::Allow));
        assert_eq!(FirewallRule::Deny.verdict(), Some(Verdict::Deny));
    }

    #[test]
    fn verdict_names_parse_lowercase() {
        let v = serde_json::from_str::<Verdict>("\"deny\"").ok();
        assert_eq!(v, Some(Verdict::Deny));
        assert!(serde_json::from_str::<Verdict>("\"DENY\"").is_err());
    }
}
