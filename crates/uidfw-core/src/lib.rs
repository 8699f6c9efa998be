//! uidfw core: the firewall data model, wire encodings, and error types.
//!
//! This crate defines the integer contract (chain ids, rule values, UIDs)
//! and the error surface shared by the engine and its hosts. It carries no
//! runtime or concurrency dependencies so it can be reused on either side of
//! whatever transport delivers the calls.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every raw integer crossing the boundary goes through `TryFrom<i32>` and
//! surfaces as `FirewallError` when it is out of range.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

/// Shared error type and its `Result` alias.
pub use error::{FirewallError, Result};
pub use model::{FirewallChain, FirewallRule, Uid, Verdict};
