use std::sync::{Arc, Mutex};

use arc_swap::{ArcSwap, Guard};
use uidfw_core::error::{FirewallError, Result};
use uidfw_core::{FirewallChain, FirewallRule, Uid};

use super::snapshot::{rule_map, PolicySnapshot, SnapshotDraft};

/// One state change. A batch of these is applied atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetChainEnabled { chain: FirewallChain, enabled: bool },
    SetUidRule { chain: FirewallChain, uid: Uid, rule: FirewallRule },
    ReplaceUidRules { chain: FirewallChain, rules: Vec<(Uid, FirewallRule)> },
    ClearChain { chain: FirewallChain },
}

impl Mutation {
    pub fn chain(&self) -> FirewallChain {
        match self {
            Mutation::SetChainEnabled { chain, .. }
            | Mutation::SetUidRule { chain, .. }
            | Mutation::ReplaceUidRules { chain, .. }
            | Mutation::ClearChain { chain } => *chain,
        }
    }

    /// Short operation name used in logs and metric labels.
    pub fn op(&self) -> &'static str {
        match self {
            Mutation::SetChainEnabled { .. } => "set_chain_enabled",
            Mutation::SetUidRule { .. } => "set_uid_rule",
            Mutation::ReplaceUidRules { .. } => "replace_uid_rules",
            Mutation::ClearChain { .. } => "clear_chain",
        }
    }

    fn apply_to(&self, draft: &mut SnapshotDraft) -> bool {
        match self {
            Mutation::SetChainEnabled { chain, enabled } => {
                if draft.chain(*chain).is_enabled() == *enabled {
                    return false;
                }
                draft.chain_mut(*chain).set_enabled(*enabled)
            }
            Mutation::SetUidRule { chain, uid, rule } => {
                if draft.chain(*chain).rule(*uid) == *rule {
                    return false;
                }
                draft.chain_mut(*chain).set_rule(*uid, *rule)
            }
            Mutation::ReplaceUidRules { chain, rules } => {
                let next = rule_map(rules);
                if draft.chain(*chain).has_rules(&next) {
                    return false;
                }
                draft.chain_mut(*chain).replace_rules(next)
            }
            Mutation::ClearChain { chain } => {
                if draft.chain(*chain).is_empty() {
                    return false;
                }
                draft.chain_mut(*chain).clear()
            }
        }
    }
}

/// Ordered list of mutations published as a single snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyBatch {
    mutations: Vec<Mutation>,
}

impl PolicyBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_chain_enabled(mut self, chain: FirewallChain, enabled: bool) -> Self {
        self.mutations.push(Mutation::SetChainEnabled { chain, enabled });
        self
    }

    pub fn set_uid_rule(mut self, chain: FirewallChain, uid: Uid, rule: FirewallRule) -> Self {
        self.mutations.push(Mutation::SetUidRule { chain, uid, rule });
        self
    }

    pub fn replace_uid_rules(
        mut self,
        chain: FirewallChain,
        rules: Vec<(Uid, FirewallRule)>,
    ) -> Self {
        self.mutations.push(Mutation::ReplaceUidRules { chain, rules });
        self
    }

    pub fn clear_chain(mut self, chain: FirewallChain) -> Self {
        self.mutations.push(Mutation::ClearChain { chain });
        self
    }

    pub fn push(&mut self, m: Mutation) {
        self.mutations.push(m);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }
}

/// What a batch did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// Indices into the batch of the mutations that changed state.
    pub changed: Vec<usize>,
    /// Generation of the published snapshot, `None` when nothing changed.
    pub generation: Option<u64>,
}

impl Applied {
    pub fn is_changed(&self) -> bool {
        self.generation.is_some()
    }
}

/// Authoritative chain/rule state.
///
/// Readers load the published `Arc<PolicySnapshot>` without locking.
/// Writers serialize on `writer`, derive the next snapshot copy-on-write,
/// and swap it in. A batch is therefore visible entirely or not at all.
pub struct PolicyStore {
    current: ArcSwap<PolicySnapshot>,
    writer: Mutex<()>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    /// Every recognized chain registered, disabled, and empty.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(PolicySnapshot::empty()),
            writer: Mutex::new(()),
        }
    }

    /// Currently published snapshot.
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.current.load_full()
    }

    /// Borrow the published snapshot without touching its refcount.
    /// Hold the guard only for the duration of one evaluation.
    pub fn load(&self) -> Guard<Arc<PolicySnapshot>> {
        self.current.load()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Stored rule, not the effective verdict.
    pub fn uid_rule(&self, chain: FirewallChain, uid: Uid) -> FirewallRule {
        self.current.load().uid_rule(chain, uid)
    }

    pub fn is_chain_enabled(&self, chain: FirewallChain) -> bool {
        self.current.load().is_enabled(chain)
    }

    /// Returns whether state changed. Rules of the chain are untouched.
    pub fn set_chain_enabled(&self, chain: FirewallChain, enabled: bool) -> Result<bool> {
        self.apply_one(Mutation::SetChainEnabled { chain, enabled })
    }

    /// `FirewallRule::Default` removes the entry.
    pub fn set_uid_rule(&self, chain: FirewallChain, uid: Uid, rule: FirewallRule) -> Result<bool> {
        self.apply_one(Mutation::SetUidRule { chain, uid, rule })
    }

    pub fn replace_uid_rules(
        &self,
        chain: FirewallChain,
        rules: Vec<(Uid, FirewallRule)>,
    ) -> Result<bool> {
        self.apply_one(Mutation::ReplaceUidRules { chain, rules })
    }

    pub fn clear_chain(&self, chain: FirewallChain) -> Result<bool> {
        self.apply_one(Mutation::ClearChain { chain })
    }

    fn apply_one(&self, m: Mutation) -> Result<bool> {
        let mut batch = PolicyBatch::new();
        batch.push(m);
        self.apply(&batch).map(|a| a.is_changed())
    }

    /// Apply every mutation in order and publish one snapshot.
    ///
    /// Nothing is published when no mutation changes state, so the
    /// generation only moves on real changes.
    pub fn apply(&self, batch: &PolicyBatch) -> Result<Applied> {
        let _w = self
            .writer
            .lock()
            .map_err(|_| FirewallError::Internal("policy store writer lock poisoned".into()))?;

        let current = self.current.load_full();
        let mut draft = current.next_draft();
        let mut changed = Vec::new();

        for (i, m) in batch.mutations().iter().enumerate() {
            let applied = m.apply_to(&mut draft);
            match m {
                Mutation::SetChainEnabled { chain, enabled } if applied => {
                    tracing::info!(chain = %chain, enabled = *enabled, "firewall chain toggled");
                }
                Mutation::SetUidRule { chain, uid, rule } if applied => {
                    tracing::debug!(
                        chain = %chain,
                        uid = %uid,
                        rule = %rule,
                        "uid firewall rule set"
                    );
                }
                Mutation::ReplaceUidRules { chain, rules } if applied => {
                    tracing::debug!(
                        chain = %chain,
                        entries = rules.len(),
                        "uid firewall rules replaced"
                    );
                }
                Mutation::ClearChain { chain } if applied => {
                    tracing::debug!(chain = %chain, "firewall chain cleared");
                }
                _ => {}
            }
            if applied {
                changed.push(i);
            }
        }

        if changed.is_empty() {
            return Ok(Applied::default());
        }

        let next = draft.publish();
        let generation = next.generation();
        self.current.store(Arc::new(next));
        tracing::trace!(generation, mutations = changed.len(), "policy snapshot published");
        Ok(Applied { changed, generation: Some(generation) })
    }
}
