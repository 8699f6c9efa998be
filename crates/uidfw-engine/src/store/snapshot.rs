//! Immutable, generation-stamped policy snapshots.
//!
//! A snapshot is never mutated after publication. Writers derive the next
//! snapshot copy-on-write: the per-chain states are `Arc`-shared, so a
//! mutation only clones the chains it touches.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uidfw_core::{FirewallChain, FirewallRule, Uid};

pub(crate) type RuleMap = HashMap<Uid, FirewallRule>;

/// Sparse map for a bulk replace. The last entry for a uid wins, including
/// a trailing `Default`, which removes it.
pub(crate) fn rule_map(entries: &[(Uid, FirewallRule)]) -> RuleMap {
    let mut next = HashMap::with_capacity(entries.len());
    for &(uid, rule) in entries {
        match rule {
            FirewallRule::Default => next.remove(&uid),
            explicit => next.insert(uid, explicit),
        };
    }
    next
}

/// One chain's enabled flag and sparse rule map.
///
/// The map never holds `FirewallRule::Default`; absence means default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainState {
    enabled: bool,
    rules: RuleMap,
}

impl ChainState {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stored rule for `uid`, `Default` when there is no entry.
    pub fn rule(&self, uid: Uid) -> FirewallRule {
        self.rules.get(&uid).copied().unwrap_or_default()
    }

    /// Number of explicit (non-default) entries.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = (Uid, FirewallRule)> + '_ {
        self.rules.iter().map(|(u, r)| (*u, *r))
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        true
    }

    /// Returns whether the stored map changed.
    pub(crate) fn set_rule(&mut self, uid: Uid, rule: FirewallRule) -> bool {
        match rule {
            FirewallRule::Default => self.rules.remove(&uid).is_some(),
            explicit => self.rules.insert(uid, explicit) != Some(explicit),
        }
    }

    pub(crate) fn has_rules(&self, rules: &RuleMap) -> bool {
        self.rules == *rules
    }

    pub(crate) fn replace_rules(&mut self, next: RuleMap) -> bool {
        if self.has_rules(&next) {
            return false;
        }
        self.rules = next;
        true
    }

    pub(crate) fn clear(&mut self) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        self.rules.clear();
        true
    }
}

/// Point-in-time view of every chain.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    generation: u64,
    chains: [Arc<ChainState>; FirewallChain::COUNT],
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl PolicySnapshot {
    /// All chains registered, disabled, and without rules. Generation 0.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            chains: Default::default(),
        }
    }

    /// Number of mutations published before this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn chain(&self, chain: FirewallChain) -> &ChainState {
        &self.chains[chain.index()]
    }

    pub fn is_enabled(&self, chain: FirewallChain) -> bool {
        self.chain(chain).is_enabled()
    }

    pub fn uid_rule(&self, chain: FirewallChain, uid: Uid) -> FirewallRule {
        self.chain(chain).rule(uid)
    }

    pub fn enabled_chains(&self) -> impl Iterator<Item = FirewallChain> + '_ {
        FirewallChain::ALL.into_iter().filter(|c| self.is_enabled(*c))
    }

    /// Serializable copy for operator dumps. Rules are sorted by uid.
    pub fn dump(&self) -> SnapshotDump {
        let chains = FirewallChain::ALL
            .into_iter()
            .map(|chain| {
                let state = self.chain(chain);
                let mut rules: Vec<RuleDump> = state
                    .rules()
                    .map(|(uid, rule)| RuleDump { uid, rule })
                    .collect();
                rules.sort_by_key(|r| r.uid);
                ChainDump { chain, enabled: state.is_enabled(), rules }
            })
            .collect();
        SnapshotDump { generation: self.generation, chains }
    }

    pub(crate) fn next_draft(&self) -> SnapshotDraft {
        SnapshotDraft {
            generation: self.generation,
            chains: self.chains.clone(),
        }
    }
}

/// Writer-side working copy. Only the store turns it into a published snapshot.
pub(crate) struct SnapshotDraft {
    generation: u64,
    chains: [Arc<ChainState>; FirewallChain::COUNT],
}

impl SnapshotDraft {
    pub(crate) fn chain_mut(&mut self, chain: FirewallChain) -> &mut ChainState {
        Arc::make_mut(&mut self.chains[chain.index()])
    }

    pub(crate) fn chain(&self, chain: FirewallChain) -> &ChainState {
        &self.chains[chain.index()]
    }

    pub(crate) fn publish(self) -> PolicySnapshot {
        PolicySnapshot {
            generation: self.generation + 1,
            chains: self.chains,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SnapshotDump {
    pub generation: u64,
    pub chains: Vec<ChainDump>,
}

#[derive(Debug, Serialize)]
pub struct ChainDump {
    pub chain: FirewallChain,
    pub enabled: bool,
    pub rules: Vec<RuleDump>,
}

#[derive(Debug, Serialize)]
pub struct RuleDump {
    pub uid: Uid,
    pub rule: FirewallRule,
}
