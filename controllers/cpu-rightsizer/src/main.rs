//! CPU Rightsizer
//!
//! One-shot tool that lowers oversized CPU requests across a cluster:
//! - Scans every pod and lists containers reserving at least the threshold
//! - Skips pods marked as managed by another tool
//! - After confirmation, edits the owning Deployment's pod template and
//!   triggers a rolling restart (or deletes pods that have no editable owner)
//! - Re-scans after a grace period and reports what changed
//!
//! Reports and the prompt go to stdout; logs go to stderr.

mod backoff;
mod config;
mod error;
mod inspector;
mod mutator;
mod ownership;
mod policy;
mod prompt;
mod quantity;
mod reconciler;
mod report;
mod rollout;

#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::error::RightsizerError;
use crate::reconciler::{Reconciler, RunStatus};
use cluster_client::ClusterClient;
use std::io;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RightsizerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    info!("Starting CPU Rightsizer");

    let config = Config::from_env()?;
    info!("Configuration:");
    info!("  Threshold: {}", config.policy.threshold);
    info!("  Reduction: {:?}", config.policy.rule);
    info!("  Managed-by label: {}", config.policy.managed_by_label);
    info!(
        "  Verification: {} check(s), {:?} grace period",
        config.verify.attempts, config.verify.grace_period
    );

    let client = ClusterClient::try_default().await?;
    let reconciler = Reconciler::new(client, config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let status = reconciler.run(&mut stdin.lock(), &mut stdout.lock()).await?;

    match status {
        RunStatus::NothingToDo => info!("Nothing to change"),
        RunStatus::Declined => info!("Changes declined"),
        RunStatus::Completed(summary) => info!(
            "Done: {} workloads restarted, {} pods deleted, {} failures",
            summary.restarted.len(),
            summary.terminated.len(),
            summary.failure_count()
        ),
    }

    Ok(())
}
