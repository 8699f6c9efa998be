//! Policy store (chain flags + per-UID rules).
//!
//! Holds the authoritative state and publishes immutable snapshots for the
//! evaluator. Mutations are serialized; reads never wait on them.

pub mod policy_store;
pub mod snapshot;

pub use policy_store::{Applied, Mutation, PolicyBatch, PolicyStore};
pub use snapshot::{ChainState, PolicySnapshot, SnapshotDump};
