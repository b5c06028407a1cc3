//! Workload inspection.
//!
//! Scans every pod in the cluster and extracts, per container, the CPU
//! figure the rightsizer compares against policy.

use crate::error::RightsizerError;
use crate::quantity::{Millicores, parse_cpu};
use cluster_client::{ClusterClientTrait, controller_owner};
use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const CPU: &str = "cpu";

/// Which resource field the effective reservation was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationSource {
    Limit,
    Request,
}

/// Kind and name of a pod's controlling owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSummary {
    pub kind: String,
    pub name: String,
}

/// One container's effective CPU reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerReservation {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub owner: Option<OwnerSummary>,
    pub reservation: Millicores,
    pub source: ReservationSource,
    /// The declared CPU request, which is what a mutation rewrites.
    pub request: Option<Millicores>,
    pub labels: BTreeMap<String, String>,
}

/// The CPU quantity used for comparison: the limit when declared, else the request.
pub fn effective_cpu(container: &Container) -> Option<(&Quantity, ReservationSource)> {
    let resources = container.resources.as_ref()?;
    if let Some(limit) = resources.limits.as_ref().and_then(|l| l.get(CPU)) {
        return Some((limit, ReservationSource::Limit));
    }
    resources
        .requests
        .as_ref()
        .and_then(|r| r.get(CPU))
        .map(|request| (request, ReservationSource::Request))
}

fn declared_request(container: &Container) -> Option<Millicores> {
    let requests = container.resources.as_ref()?.requests.as_ref()?;
    parse_cpu(&requests.get(CPU)?.0).ok()
}

fn is_terminal(pod: &Pod) -> bool {
    matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some("Succeeded") | Some("Failed")
    )
}

/// Extract reservations from one pod, in container order.
///
/// Containers without a CPU figure are skipped silently; containers whose
/// figure does not parse are skipped with a warning.
pub fn reservations_for_pod(pod: &Pod) -> Vec<ContainerReservation> {
    let (Some(namespace), Some(name)) = (pod.metadata.namespace.as_deref(), pod.metadata.name.as_deref()) else {
        debug!("Skipping pod without namespace or name");
        return Vec::new();
    };
    if is_terminal(pod) {
        debug!("Skipping terminated pod {}/{}", namespace, name);
        return Vec::new();
    }
    let Some(spec) = pod.spec.as_ref() else {
        return Vec::new();
    };

    let owner = controller_owner(&pod.metadata).map(|o| OwnerSummary {
        kind: o.kind.clone(),
        name: o.name.clone(),
    });
    let labels = pod.metadata.labels.clone().unwrap_or_default();

    spec.containers
        .iter()
        .filter_map(|container| {
            let (quantity, source) = effective_cpu(container)?;
            match parse_cpu(&quantity.0) {
                Ok(reservation) => Some(ContainerReservation {
                    namespace: namespace.to_string(),
                    pod: name.to_string(),
                    container: container.name.clone(),
                    owner: owner.clone(),
                    reservation,
                    source,
                    request: declared_request(container),
                    labels: labels.clone(),
                }),
                Err(e) => {
                    warn!(
                        "Skipping container {} in pod {}/{}: {}",
                        container.name, namespace, name, e
                    );
                    None
                }
            }
        })
        .collect()
}

/// Order by reservation, largest first. Ties keep discovery order.
pub fn sort_by_reservation(reservations: &mut [ContainerReservation]) {
    reservations.sort_by(|a, b| b.reservation.cmp(&a.reservation));
}

/// Scan every pod in every namespace.
///
/// A failure to list pods is returned to the caller; nothing below that
/// level fails the scan.
pub async fn scan(client: &dyn ClusterClientTrait) -> Result<Vec<ContainerReservation>, RightsizerError> {
    let pods = client.list_pods().await?;

    let mut reservations: Vec<ContainerReservation> = pods.iter().flat_map(reservations_for_pod).collect();
    sort_by_reservation(&mut reservations);

    info!(
        "Scanned {} pods, {} containers declare a CPU reservation",
        pods.len(),
        reservations.len()
    );
    Ok(reservations)
}
