//! Engine config loader (strict parsing).

pub mod schema;

use std::fs;

use uidfw_core::error::{FirewallError, Result};

pub use schema::{ChainConfig, EvaluatorSection, FirewallConfig};

pub fn load_from_file(path: &str) -> Result<FirewallConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| FirewallError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<FirewallConfig> {
    let cfg: FirewallConfig = serde_yaml::from_str(s)
        .map_err(|e| FirewallError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
