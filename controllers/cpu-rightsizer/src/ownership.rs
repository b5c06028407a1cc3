//! Ownership resolution.
//!
//! Walks controller references from a pod to the Deployment that owns it:
//! Pod → ReplicaSet → Deployment. Anything else ends in an instance-only
//! action.

use crate::error::RightsizerError;
use cluster_client::{ClusterClientTrait, controller_owner};
use std::fmt;
use tracing::{debug, warn};

/// Top-level workload kinds the mutator can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Deployment,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::Deployment => f.write_str("Deployment"),
        }
    }
}

/// A namespaced top-level workload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadRef {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Where a candidate's change has to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipResolution {
    /// The pod belongs to a workload whose template can be edited.
    Workload(WorkloadRef),
    /// No editable workload; the pod itself is restarted.
    InstanceOnly { reason: String },
}

impl OwnershipResolution {
    fn instance_only(reason: impl Into<String>) -> Self {
        OwnershipResolution::InstanceOnly { reason: reason.into() }
    }
}

/// Resolve the workload owning a pod.
///
/// Lookup failures do not propagate: they are logged and the candidate
/// degrades to an instance-only action.
pub async fn resolve(client: &dyn ClusterClientTrait, namespace: &str, pod: &str) -> OwnershipResolution {
    match walk(client, namespace, pod).await {
        Ok(resolution) => {
            debug!("Pod {}/{} resolves to {:?}", namespace, pod, resolution);
            resolution
        }
        Err(e) => {
            warn!("Could not resolve owner of Pod {}/{}: {}; falling back to pod restart", namespace, pod, e);
            OwnershipResolution::instance_only(e.to_string())
        }
    }
}

async fn walk(client: &dyn ClusterClientTrait, namespace: &str, pod: &str) -> Result<OwnershipResolution, RightsizerError> {
    let live = client
        .get_pod(namespace, pod)
        .await
        .map_err(|e| RightsizerError::Lookup(format!("Pod {}/{}: {}", namespace, pod, e)))?;

    let Some(owner) = controller_owner(&live.metadata) else {
        return Ok(OwnershipResolution::instance_only("pod has no owner"));
    };

    match owner.kind.as_str() {
        "Deployment" => Ok(deployment(namespace, &owner.name)),
        "ReplicaSet" => {
            let replica_set = client
                .get_replica_set(namespace, &owner.name)
                .await
                .map_err(|e| RightsizerError::Lookup(format!("ReplicaSet {}/{}: {}", namespace, owner.name, e)))?;
            match controller_owner(&replica_set.metadata) {
                Some(parent) if parent.kind == "Deployment" => Ok(deployment(namespace, &parent.name)),
                Some(parent) => Ok(OwnershipResolution::instance_only(format!(
                    "ReplicaSet {} is owned by unsupported kind {}",
                    owner.name, parent.kind
                ))),
                None => Ok(OwnershipResolution::instance_only(format!(
                    "ReplicaSet {} has no owner",
                    owner.name
                ))),
            }
        }
        other => Ok(OwnershipResolution::instance_only(format!("owner kind {} is not supported", other))),
    }
}

fn deployment(namespace: &str, name: &str) -> OwnershipResolution {
    OwnershipResolution::Workload(WorkloadRef {
        kind: WorkloadKind::Deployment,
        namespace: namespace.to_string(),
        name: name.to_string(),
    })
}
