//! Rollout triggers and post-change verification.
//!
//! Deployments are restarted the way `kubectl rollout restart` does it, by
//! stamping the pod template with a `restartedAt` annotation. Pods without an
//! editable owner are deleted and left to whatever recreates them.

use crate::backoff::FibonacciBackoff;
use crate::error::RightsizerError;
use crate::inspector;
use crate::ownership::WorkloadRef;
use crate::policy::{PolicyEngine, PolicyOutcome};
use chrono::{DateTime, Utc};
use cluster_client::ClusterClientTrait;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

/// Annotation the platform's rollout logic reacts to.
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Longest wait between verification scans, in grace periods.
const MAX_BACKOFF_STEPS: u32 = 6;

/// Merge patch that restarts a Deployment's pods.
pub fn restart_patch(now: DateTime<Utc>) -> serde_json::Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        (RESTARTED_AT_ANNOTATION): now.to_rfc3339()
                    }
                }
            }
        }
    })
}

/// Trigger a rolling restart of a workload.
pub async fn restart_workload(
    client: &dyn ClusterClientTrait,
    workload: &WorkloadRef,
    now: DateTime<Utc>,
) -> Result<(), RightsizerError> {
    info!("Restarting {}", workload);
    client
        .patch_deployment(&workload.namespace, &workload.name, &restart_patch(now))
        .await
        .map_err(|source| RightsizerError::Restart {
            workload: workload.clone(),
            source,
        })?;
    Ok(())
}

/// Delete a pod so that its controller recreates it.
pub async fn terminate_instance(client: &dyn ClusterClientTrait, namespace: &str, pod: &str) -> Result<(), RightsizerError> {
    info!("Restarting pod {} in namespace {}", pod, namespace);
    client
        .delete_pod(namespace, pod)
        .await
        .map_err(|source| RightsizerError::Terminate {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            source,
        })
}

/// How long and how often to look for the new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifySettings {
    pub grace_period: Duration,
    pub attempts: u32,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            attempts: 1,
        }
    }
}

/// Post-change snapshot.
#[derive(Debug, Clone)]
pub struct Verification {
    /// Reservations still at or above the threshold.
    pub outcome: PolicyOutcome,
    /// Scans performed.
    pub attempts: u32,
}

impl Verification {
    pub fn remaining_actionable(&self) -> usize {
        self.outcome.actionable().count()
    }
}

/// Wait out the grace period and re-scan.
///
/// With more than one attempt the scan is repeated, with Fibonacci spacing,
/// until nothing actionable remains or the attempts run out. Pods that were
/// not recycled in time show their old values; that is reported, not an
/// error.
pub async fn verify(
    client: &dyn ClusterClientTrait,
    policy: &PolicyEngine,
    settings: VerifySettings,
) -> Result<Verification, RightsizerError> {
    let attempts = settings.attempts.max(1);
    let mut backoff = FibonacciBackoff::new(settings.grace_period, MAX_BACKOFF_STEPS);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let wait = backoff.next_backoff();
        info!("Waiting {:?} for pods to restart (check {}/{})", wait, attempt, attempts);
        tokio::time::sleep(wait).await;

        let reservations = match inspector::scan(client).await {
            Ok(reservations) => reservations,
            Err(e) if attempt < attempts => {
                warn!("Verification scan failed, will retry: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let outcome = policy.classify(reservations);
        let remaining = outcome.actionable().count();
        if remaining == 0 || attempt >= attempts {
            if remaining > 0 {
                info!("{} containers have not converged yet", remaining);
            }
            return Ok(Verification { outcome, attempts: attempt });
        }
        info!("{} containers still above target, checking again", remaining);
    }
}
