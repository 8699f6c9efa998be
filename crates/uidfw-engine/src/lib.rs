//! uidfw engine library entry.
//!
//! This crate wires the policy store, the cross-chain evaluator, metrics,
//! and strict config loading into a single host-owned [`FirewallService`].
//! It is consumed by the dry-run binary (`main.rs`) and by integration tests.

pub mod config;
pub mod eval;
pub mod obs;
pub mod service;
pub mod store;

pub use service::FirewallService;
