use serde::Serialize;
use uidfw_core::error::{FirewallError, Result};
use uidfw_core::{FirewallChain, Uid, Verdict};

use crate::store::PolicySnapshot;

/// Fixed evaluation order over chains.
///
/// Chain wire values are arbitrary identifiers, so the order is always
/// explicit configuration. Chains left out are never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPriority {
    order: Vec<FirewallChain>,
}

impl ChainPriority {
    /// Rejects an empty order and repeated chains.
    pub fn new(order: Vec<FirewallChain>) -> Result<Self> {
        if order.is_empty() {
            return Err(FirewallError::BadRequest("chain priority must not be empty".into()));
        }
        let mut seen = [false; FirewallChain::COUNT];
        for c in &order {
            if std::mem::replace(&mut seen[c.index()], true) {
                return Err(FirewallError::BadRequest(format!(
                    "chain priority lists {c} more than once"
                )));
            }
        }
        Ok(Self { order })
    }

    pub fn as_slice(&self) -> &[FirewallChain] {
        &self.order
    }

    /// Recognized chains absent from the order.
    pub fn missing(&self) -> Vec<FirewallChain> {
        FirewallChain::ALL
            .into_iter()
            .filter(|c| !self.order.contains(c))
            .collect()
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub verdict: Verdict,
    /// Chain whose explicit rule decided; `None` when the default applied.
    pub decided_by: Option<FirewallChain>,
}

/// Short-circuiting, priority-ordered verdict computation.
///
/// The first enabled chain holding an explicit ALLOW or DENY for the uid
/// decides. If none does, `default_verdict` applies.
#[derive(Debug, Clone)]
pub struct Evaluator {
    priority: ChainPriority,
    default_verdict: Verdict,
}

impl Evaluator {
    pub fn new(priority: ChainPriority, default_verdict: Verdict) -> Self {
        Self { priority, default_verdict }
    }

    pub fn priority(&self) -> &ChainPriority {
        &self.priority
    }

    pub fn default_verdict(&self) -> Verdict {
        self.default_verdict
    }

    pub fn decide(&self, snapshot: &PolicySnapshot, uid: Uid) -> Decision {
        for &chain in self.priority.as_slice() {
            let state = snapshot.chain(chain);
            if !state.is_enabled() {
                continue;
            }
            if let Some(verdict) = state.rule(uid).verdict() {
                return Decision { verdict, decided_by: Some(chain) };
            }
        }
        Decision { verdict: self.default_verdict, decided_by: None }
    }

    pub fn evaluate(&self, snapshot: &PolicySnapshot, uid: Uid) -> Verdict {
        self.decide(snapshot, uid).verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PolicyBatch, PolicyStore};
    use uidfw_core::FirewallRule;

    use uidfw_core::FirewallChain::{Dozable, Metered, Standby};

    fn uid(n: i32) -> Uid {
        Uid::try_from(n).unwrap()
    }

    fn evaluator(order: Vec<FirewallChain>, default: Verdict) -> Evaluator {
        Evaluator::new(ChainPriority::new(order).unwrap(), default)
    }

    #[test]
    fn first_decisive_enabled_chain_wins() {
        let store = PolicyStore::new();
        store
            .apply(
                &PolicyBatch::new()
                    .set_chain_enabled(Standby, true)
                    .set_chain_enabled(Metered, true)
                    .set_chain_enabled(Dozable, true)
                    .set_uid_rule(Metered, uid(7), FirewallRule::Deny)
                    .set_uid_rule(Dozable, uid(7), FirewallRule::Allow),
            )
            .unwrap();

        let ev = evaluator(vec![Standby, Metered, Dozable], Verdict::Allow);
        let d = ev.decide(&store.snapshot(), uid(7));
        assert_eq!(d, Decision { verdict: Verdict::Deny, decided_by: Some(Metered) });
    }

    #[test]
    fn higher_priority_allow_overrides_lower_deny() {
        let store = PolicyStore::new();
        store
            .apply(
                &PolicyBatch::new()
                    .set_chain_enabled(Dozable, true)
                    .set_chain_enabled(Metered, true)
                    .set_uid_rule(Dozable, uid(3), FirewallRule::Allow)
                    .set_uid_rule(Metered, uid(3), FirewallRule::Deny),
            )
            .unwrap();

        let ev = evaluator(vec![Dozable, Metered], Verdict::Deny);
        assert_eq!(ev.evaluate(&store.snapshot(), uid(3)), Verdict::Allow);
    }

    #[test]
    fn disabled_chain_is_skipped() {
        let store = PolicyStore::new();
        store.set_uid_rule(Standby, uid(5), FirewallRule::Deny).unwrap();
        let ev = evaluator(vec![Standby], Verdict::Allow);
        let d = ev.decide(&store.snapshot(), uid(5));
        assert_eq!(d, Decision { verdict: Verdict::Allow, decided_by: None });
    }

    #[test]
    fn chain_outside_priority_is_ignored() {
        let store = PolicyStore::new();
        store
            .apply(
                &PolicyBatch::new()
                    .set_chain_enabled(Metered, true)
                    .set_uid_rule(Metered, uid(5), FirewallRule::Deny),
            )
            .unwrap();
        let ev = evaluator(vec![Standby, Dozable], Verdict::Allow);
        assert_eq!(ev.evaluate(&store.snapshot(), uid(5)), Verdict::Allow);
    }

    #[test]
    fn fallback_uses_configured_default() {
        let snapshot = PolicySnapshot::empty();
        assert_eq!(
            evaluator(vec![Metered], Verdict::Deny).evaluate(&snapshot, uid(1)),
            Verdict::Deny
        );
        assert_eq!(
            evaluator(vec![Metered], Verdict::Allow).evaluate(&snapshot, uid(1)),
            Verdict::Allow
        );
    }

    #[test]
    fn priority_rejects_duplicates_and_empty() {
        assert!(ChainPriority::new(vec![]).is_err());
        let err = ChainPriority::new(vec![Metered, Dozable, Metered]).unwrap_err();
        assert_eq!(err.code().as_str(), "BAD_REQUEST");
    }

    #[test]
    fn priority_reports_missing_chains() {
        let p = ChainPriority::new(vec![Dozable]).unwrap();
        assert_eq!(p.missing(), vec![Metered, Standby]);
    }
}
