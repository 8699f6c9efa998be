//! Lightweight in-process metrics.
//!
//! Counters are atomics rendered in Prometheus text format on demand; the
//! host decides whether and how to expose them.

pub mod metrics;

pub use metrics::FirewallMetrics;
