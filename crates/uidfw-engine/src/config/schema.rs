use std::collections::HashSet;

use serde::Deserialize;
use uidfw_core::error::{FirewallError, Result};
use uidfw_core::{FirewallChain, FirewallRule, Uid, Verdict};

use crate::eval::{ChainPriority, Evaluator};
use crate::store::PolicyBatch;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FirewallConfig {
    pub version: u32,

    pub evaluator: EvaluatorSection,

    /// Startup state, applied as one batch.
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

impl FirewallConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FirewallError::UnsupportedVersion(self.version));
        }

        self.evaluator.validate()?;

        let mut seen = HashSet::new();
        for c in &self.chains {
            if !seen.insert(c.chain) {
                return Err(FirewallError::BadRequest(format!(
                    "chains lists {} more than once",
                    c.chain
                )));
            }
            c.validate()?;
        }

        Ok(())
    }

    /// Batch that seeds the store with the configured chain state.
    pub fn initial_batch(&self) -> PolicyBatch {
        let mut batch = PolicyBatch::new();
        for c in &self.chains {
            batch = batch
                .replace_uid_rules(c.chain, c.rules())
                .set_chain_enabled(c.chain, c.enabled);
        }
        batch
    }
}

/// Chain order and fallback. Both are required: they are device policy,
/// not something the engine picks.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorSection {
    pub priority: Vec<FirewallChain>,
    pub default_verdict: Verdict,
}

impl EvaluatorSection {
    pub fn validate(&self) -> Result<()> {
        self.chain_priority().map(|_| ())
    }

    pub fn chain_priority(&self) -> Result<ChainPriority> {
        ChainPriority::new(self.priority.clone())
    }

    pub fn build(&self) -> Result<Evaluator> {
        Ok(Evaluator::new(self.chain_priority()?, self.default_verdict))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub chain: FirewallChain,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub allow: Vec<Uid>,

    #[serde(default)]
    pub deny: Vec<Uid>,
}

impl ChainConfig {
    pub fn validate(&self) -> Result<()> {
        let allow: HashSet<Uid> = self.allow.iter().copied().collect();
        if let Some(uid) = self.deny.iter().find(|u| allow.contains(u)) {
            return Err(FirewallError::BadRequest(format!(
                "chain {}: uid {uid} is in both allow and deny",
                self.chain
            )));
        }
        Ok(())
    }

    pub fn rules(&self) -> Vec<(Uid, FirewallRule)> {
        self.allow
            .iter()
            .map(|u| (*u, FirewallRule::Allow))
            .chain(self.deny.iter().map(|u| (*u, FirewallRule::Deny)))
            .collect()
    }
}
