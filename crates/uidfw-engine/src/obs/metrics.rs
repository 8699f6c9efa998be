//! In-process metrics registry for the firewall engine.
//!
//! Administrative paths (mutations, rejections) use `DashMap`-backed
//! labelled counters. The evaluation path only touches a fixed atomic table
//! so it never allocates. Everything renders as Prometheus text.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use uidfw_core::{FirewallChain, Verdict};

use crate::eval::Decision;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let key = label_key(labels);
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for a label set, 0 if never incremented.
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| {
                let label_str = r
                    .key()
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                (label_str, r.value().load(Ordering::Relaxed))
            })
            .collect();
        rows.sort();
        for (label_str, val) in rows {
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str, val);
        }
    }
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

// One row per deciding chain plus a trailing row for the default verdict.
const SOURCES: usize = FirewallChain::COUNT + 1;
const DEFAULT_SOURCE: usize = FirewallChain::COUNT;

/// Allocation-free decision counters indexed by (source, verdict).
#[derive(Default)]
pub struct DecisionCounters {
    table: [[AtomicU64; 2]; SOURCES],
}

impl DecisionCounters {
    pub fn record(&self, d: &Decision) {
        let row = d.decided_by.map_or(DEFAULT_SOURCE, FirewallChain::index);
        self.table[row][verdict_slot(d.verdict)].fetch_add(1, Ordering::Relaxed);
    }

    /// `None` source means decisions made by the default verdict.
    pub fn get(&self, source: Option<FirewallChain>, verdict: Verdict) -> u64 {
        let row = source.map_or(DEFAULT_SOURCE, FirewallChain::index);
        self.table[row][verdict_slot(verdict)].load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let sources = FirewallChain::ALL
            .into_iter()
            .map(Some)
            .chain(std::iter::once(None));
        for source in sources {
            let label = source.map_or("default", FirewallChain::as_str);
            for verdict in [Verdict::Allow, Verdict::Deny] {
                let _ = writeln!(
                    out,
                    "{}{{source=\"{}\",verdict=\"{}\"}} {}",
                    name,
                    label,
                    verdict.as_str(),
                    self.get(source, verdict)
                );
            }
        }
    }
}

fn verdict_slot(v: Verdict) -> usize {
    match v {
        Verdict::Allow => 0,
        Verdict::Deny => 1,
    }
}

#[derive(Default)]
pub struct FirewallMetrics {
    /// Labels: `op`, `chain`. Counts only mutations that changed state;
    /// no-op entries of a batch are skipped.
    pub mutations: CounterVec,
    /// Labels: `op`, `code`.
    pub rejections: CounterVec,
    pub decisions: DecisionCounters,
    generation: AtomicU64,
}

impl FirewallMetrics {
    /// Monotonic: a late report of an older generation is ignored.
    pub fn set_generation(&self, g: u64) {
        self.generation.fetch_max(g, Ordering::Relaxed);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Render all registered metrics plus any extra lines provided by callers.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.mutations.render("uidfw_mutations_total", &mut out);
        self.rejections.render("uidfw_rejections_total", &mut out);
        self.decisions.render("uidfw_decisions_total", &mut out);
        let _ = writeln!(
            out,
            "# TYPE uidfw_policy_generation gauge\nuidfw_policy_generation {}",
            self.generation()
        );
        for (k, v) in extra {
            let _ = writeln!(out, "{} {}", k, v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_labels_are_order_insensitive() {
        let c = CounterVec::default();
        c.inc(&[("op", "set_uid_rule"), ("chain", "metered")]);
        c.inc(&[("chain", "metered"), ("op", "set_uid_rule")]);
        assert_eq!(c.get(&[("op", "set_uid_rule"), ("chain", "metered")]), 2);
        assert_eq!(c.get(&[("op", "clear_chain"), ("chain", "metered")]), 0);
    }

    #[test]
    fn decisions_split_by_source() {
        let m = FirewallMetrics::default();
        m.decisions.record(&Decision {
            verdict: Verdict::Deny,
            decided_by: Some(FirewallChain::Standby),
        });
        m.decisions.record(&Decision { verdict: Verdict::Allow, decided_by: None });
        m.decisions.record(&Decision { verdict: Verdict::Allow, decided_by: None });

        assert_eq!(m.decisions.get(Some(FirewallChain::Standby), Verdict::Deny), 1);
        assert_eq!(m.decisions.get(None, Verdict::Allow), 2);
        assert_eq!(m.decisions.get(Some(FirewallChain::Metered), Verdict::Deny), 0);
    }

    #[test]
    fn generation_gauge_never_goes_backwards() {
        let m = FirewallMetrics::default();
        m.set_generation(5);
        m.set_generation(3);
        assert_eq!(m.generation(), 5);
        m.set_generation(6);
        assert_eq!(m.generation(), 6);
    }

    #[test]
    fn render_contains_all_families() {
        let m = FirewallMetrics::default();
        m.rejections.inc(&[("op", "set_uid_rule"), ("code", "INVALID_UID")]);
        m.set_generation(4);
        let text = m.render(&[("uidfw_build_info", 1)]);
        assert!(text
            .contains("uidfw_rejections_total{code=\"INVALID_UID\",op=\"set_uid_rule\"} 1"));
        assert!(text.contains("uidfw_decisions_total{source=\"default\",verdict=\"allow\"} 0"));
        assert!(text.contains("uidfw_policy_generation 4"));
        assert!(text.contains("uidfw_build_info 1"));
    }
}
