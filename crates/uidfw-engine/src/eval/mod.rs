//! Cross-chain verdict evaluation.

pub mod evaluator;

pub use evaluator::{ChainPriority, Decision, Evaluator};
