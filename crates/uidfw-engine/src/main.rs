//! uidfw dry-run tool
//!
//! Loads the policy config (`UIDFW_CONFIG`, default `uidfw.yaml`), builds the
//! service, and prints one JSON line per UID argument with its verdict.
//! `--dump` prints the seeded snapshot instead; `--metrics` appends the
//! metrics text after evaluating.

use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use uidfw_core::error::{FirewallError, Result};
use uidfw_core::{FirewallChain, Verdict};
use uidfw_engine::{config, FirewallService};

#[derive(Serialize)]
struct VerdictLine {
    uid: i32,
    verdict: Verdict,
    decided_by: Option<FirewallChain>,
}

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run() {
        tracing::error!(code = e.code().as_str(), error = %e, "uidfw failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let path = std::env::var("UIDFW_CONFIG").unwrap_or_else(|_| "uidfw.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let svc = FirewallService::new(&cfg)?;
    tracing::info!(config = %path, "policy loaded");

    let mut dump = false;
    let mut metrics = false;
    let mut uids = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dump" => dump = true,
            "--metrics" => metrics = true,
            other => {
                let uid: i32 = other
                    .parse()
                    .map_err(|_| FirewallError::BadRequest(format!("not a uid: {other}")))?;
                uids.push(uid);
            }
        }
    }

    if dump {
        println!("{}", to_json(&svc.snapshot().dump())?);
    }

    for uid in uids {
        let d = svc.decide(uid)?;
        let line = VerdictLine { uid, verdict: d.verdict, decided_by: d.decided_by };
        println!("{}", to_json(&line)?);
    }

    if metrics {
        print!("{}", svc.metrics().render(&[]));
    }
    Ok(())
}

fn to_json<T: Serialize>(v: &T) -> Result<String> {
    serde_json::to_string(v)
        .map_err(|e| FirewallError::Internal(format!("json encode failed: {e}")))
}
