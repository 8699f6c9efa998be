//! Host-owned firewall service handle.
//!
//! Wraps the policy store, evaluator, and metrics behind the integer call
//! contract (`setFirewallChainEnabled`, `setUidFirewallRule`,
//! `getUidFirewallRule`) plus the `evaluate(uid)` entry point used by the
//! packet path. Construct once, then clone the handle; clones share state.
//! Callers are assumed to be authorized already.

use std::sync::Arc;

use uidfw_core::error::{FirewallError, Result};
use uidfw_core::{FirewallChain, FirewallRule, Uid, Verdict};

use crate::config::FirewallConfig;
use crate::eval::{Decision, Evaluator};
use crate::obs::FirewallMetrics;
use crate::store::{Mutation, PolicyBatch, PolicyStore, PolicySnapshot};

#[derive(Clone)]
pub struct FirewallService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    store: PolicyStore,
    evaluator: Evaluator,
    metrics: FirewallMetrics,
}

impl FirewallService {
    /// Build the service from validated config and seed the configured
    /// chain state in one batch.
    pub fn new(cfg: &FirewallConfig) -> Result<Self> {
        cfg.validate()?;
        let evaluator = cfg.evaluator.build()?;

        for chain in evaluator.priority().missing() {
            tracing::warn!(
                chain = %chain,
                "chain is not in evaluator.priority and will never be evaluated"
            );
        }

        let svc = Self::with_evaluator(evaluator);
        let batch = cfg.initial_batch();
        if !batch.is_empty() {
            svc.apply(&batch)?;
        }

        tracing::info!(
            priority = ?svc.evaluator().priority().as_slice(),
            default_verdict = %svc.evaluator().default_verdict(),
            generation = svc.store().generation(),
            "firewall service ready"
        );
        Ok(svc)
    }

    /// Empty store (all chains disabled, no rules) with the given evaluator.
    pub fn with_evaluator(evaluator: Evaluator) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                store: PolicyStore::new(),
                evaluator,
                metrics: FirewallMetrics::default(),
            }),
        }
    }

    pub fn store(&self) -> &PolicyStore {
        &self.inner.store
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.inner.evaluator
    }

    pub fn metrics(&self) -> &FirewallMetrics {
        &self.inner.metrics
    }

    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.inner.store.snapshot()
    }

    // ---- integer call contract ----

    pub fn set_firewall_chain_enabled(&self, chain: i32, enable: bool) -> Result<()> {
        const OP: &str = "set_chain_enabled";
        let chain = self.parse(OP, FirewallChain::try_from(chain))?;
        self.apply_one(Mutation::SetChainEnabled { chain, enabled: enable })
    }

    pub fn set_uid_firewall_rule(&self, chain: i32, uid: i32, rule: i32) -> Result<()> {
        const OP: &str = "set_uid_rule";
        let chain = self.parse(OP, FirewallChain::try_from(chain))?;
        let uid = self.parse(OP, Uid::try_from(uid))?;
        let rule = self.parse(OP, FirewallRule::try_from(rule))?;
        self.apply_one(Mutation::SetUidRule { chain, uid, rule })
    }

    /// Stored rule as its wire value. Not the effective verdict; use
    /// [`FirewallService::evaluate`] for that.
    pub fn get_uid_firewall_rule(&self, chain: i32, uid: i32) -> Result<i32> {
        const OP: &str = "get_uid_rule";
        let chain = self.parse(OP, FirewallChain::try_from(chain))?;
        let uid = self.parse(OP, Uid::try_from(uid))?;
        Ok(self.inner.store.uid_rule(chain, uid).as_raw())
    }

    /// Replace a chain's whole rule map. `uids[i]` gets `rules[i]`.
    pub fn set_uid_firewall_rules(&self, chain: i32, uids: &[i32], rules: &[i32]) -> Result<()> {
        const OP: &str = "replace_uid_rules";
        let chain = self.parse(OP, FirewallChain::try_from(chain))?;
        if uids.len() != rules.len() {
            return self.parse(
                OP,
                Err(FirewallError::BadRequest(format!(
                    "uids and rules length mismatch ({} vs {})",
                    uids.len(),
                    rules.len()
                ))),
            );
        }
        let mut entries = Vec::with_capacity(uids.len());
        for (&u, &r) in uids.iter().zip(rules) {
            let uid = self.parse(OP, Uid::try_from(u))?;
            let rule = self.parse(OP, FirewallRule::try_from(r))?;
            entries.push((uid, rule));
        }
        self.apply_one(Mutation::ReplaceUidRules { chain, rules: entries })
    }

    pub fn is_firewall_chain_enabled(&self, chain: i32) -> Result<bool> {
        let chain = self.parse("is_chain_enabled", FirewallChain::try_from(chain))?;
        Ok(self.inner.store.is_chain_enabled(chain))
    }

    pub fn clear_firewall_chain(&self, chain: i32) -> Result<()> {
        let chain = self.parse("clear_chain", FirewallChain::try_from(chain))?;
        self.apply_one(Mutation::ClearChain { chain })
    }

    // ---- evaluation ----

    pub fn evaluate(&self, uid: i32) -> Result<Verdict> {
        self.decide(uid).map(|d| d.verdict)
    }

    pub fn decide(&self, uid: i32) -> Result<Decision> {
        let uid = self.parse("evaluate", Uid::try_from(uid))?;
        Ok(self.decide_uid(uid))
    }

    /// Typed hot path: one snapshot load, no locks, no allocation.
    pub fn decide_uid(&self, uid: Uid) -> Decision {
        let snapshot = self.inner.store.load();
        let d = self.inner.evaluator.decide(&snapshot, uid);
        self.inner.metrics.decisions.record(&d);
        tracing::trace!(
            uid = %uid,
            verdict = %d.verdict,
            decided_by = ?d.decided_by,
            "uid evaluated"
        );
        d
    }

    // ---- typed mutation ----

    /// Apply a batch atomically. Returns whether state changed.
    ///
    /// Only the mutations that changed state are counted.
    pub fn apply(&self, batch: &PolicyBatch) -> Result<bool> {
        let applied = self.inner.store.apply(batch)?;
        let m = &self.inner.metrics;
        for &i in &applied.changed {
            if let Some(mutation) = batch.mutations().get(i) {
                m.mutations.inc(&[("op", mutation.op()), ("chain", mutation.chain().as_str())]);
            }
        }
        if let Some(g) = applied.generation {
            m.set_generation(g);
        }
        Ok(applied.is_changed())
    }

    fn apply_one(&self, m: Mutation) -> Result<()> {
        let mut batch = PolicyBatch::new();
        batch.push(m);
        self.apply(&batch).map(|_| ())
    }

    /// Pass through a boundary conversion, logging and counting rejections.
    fn parse<T>(&self, op: &'static str, res: Result<T>) -> Result<T> {
        res.map_err(|e| {
            let code = e.code().as_str();
            tracing::warn!(op, code, error = %e, "firewall call rejected");
            self.inner.metrics.rejections.inc(&[("op", op), ("code", code)]);
            e
        })
    }
}
