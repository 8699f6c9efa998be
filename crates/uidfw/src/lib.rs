//! Top-level facade crate for uidfw.
//!
//! Re-exports the core model and the engine so hosts can depend on a single crate.

pub mod core {
    pub use uidfw_core::*;
}

pub mod engine {
    pub use uidfw_engine::*;
}

pub use uidfw_core::{FirewallChain, FirewallError, FirewallRule, Uid, Verdict};
pub use uidfw_engine::FirewallService;
