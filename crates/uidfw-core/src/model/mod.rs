//! Firewall data model (chains, rules, UIDs, verdicts).
//!
//! The call boundary speaks bare integers:
//! - chains: METERED = 1, DOZABLE = 2, STANDBY = 3
//! - rules: DEFAULT = 0, ALLOW = 1, DENY = 2
//! - uids: non-negative `i32`
//!
//! Each integer is converted exactly once through `TryFrom<i32>` into a
//! closed type, so engine code matches exhaustively and never re-validates.

pub mod chain;
pub mod rule;
pub mod uid;

pub use chain::FirewallChain;
pub use rule::{FirewallRule, Verdict};
pub use uid::Uid;
