//! Deployment template mutation.
//!
//! Read-modify-write of a Deployment's pod template: one container's CPU
//! request is set and the whole object is written back.

use crate::error::RightsizerError;
use crate::ownership::WorkloadRef;
use crate::quantity::Millicores;
use cluster_client::{ClusterClientTrait, ClusterError};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::{debug, info, warn};

/// What a mutation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The Deployment was replaced with the new request.
    Updated,
    /// The template already carried the requested value; nothing written.
    AlreadyApplied,
    /// The template has no container with that name; nothing written.
    ContainerNotFound,
}

/// Set `container`'s CPU request to `value` in a Deployment's pod template.
///
/// Returns `None` when the container is not in the template, otherwise
/// whether the request changed.
pub fn set_cpu_request(deployment: &mut Deployment, container: &str, value: Millicores) -> Option<bool> {
    let target = deployment
        .spec
        .as_mut()?
        .template
        .spec
        .as_mut()?
        .containers
        .iter_mut()
        .find(|c| c.name == container)?;

    let desired = Quantity(value.to_string());
    let requests = target
        .resources
        .get_or_insert_with(ResourceRequirements::default)
        .requests
        .get_or_insert_with(Default::default);
    if requests.get("cpu") == Some(&desired) {
        return Some(false);
    }
    requests.insert("cpu".to_string(), desired);
    Some(true)
}

/// Apply a new CPU request to a workload.
///
/// A replace that loses a race with a concurrent edit comes back as a
/// conflict; with `conflict_retries > 0` the read-modify-write is repeated
/// that many more times before giving up.
pub async fn apply_reservation(
    client: &dyn ClusterClientTrait,
    workload: &WorkloadRef,
    container: &str,
    value: Millicores,
    conflict_retries: u32,
) -> Result<MutationOutcome, RightsizerError> {
    let mutation_error = |source: ClusterError| RightsizerError::Mutation {
        workload: workload.clone(),
        source,
    };

    let mut attempt = 0;
    loop {
        let mut deployment = client
            .get_deployment(&workload.namespace, &workload.name)
            .await
            .map_err(mutation_error)?;

        match set_cpu_request(&mut deployment, container, value) {
            None => {
                warn!("Container {} not found in {}, leaving it unchanged", container, workload);
                return Ok(MutationOutcome::ContainerNotFound);
            }
            Some(false) => {
                debug!("{} container {} already requests {}", workload, container, value);
                return Ok(MutationOutcome::AlreadyApplied);
            }
            Some(true) => {}
        }

        match client
            .replace_deployment(&workload.namespace, &workload.name, &deployment)
            .await
        {
            Ok(_) => {
                info!("Updated {} in {} to {}", container, workload, value);
                return Ok(MutationOutcome::Updated);
            }
            Err(e) if e.is_conflict() && attempt < conflict_retries => {
                attempt += 1;
                warn!("{} changed while updating, retrying ({}/{})", workload, attempt, conflict_retries);
            }
            Err(e) => return Err(mutation_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::WorkloadKind;
    use crate::test_utils::*;
    use cluster_client::{MockClusterClient, WriteCall};

    fn web() -> WorkloadRef {
        WorkloadRef {
            kind: WorkloadKind::Deployment,
            namespace: "shop".to_string(),
            name: "web".to_string(),
        }
    }

    fn template_request(client: &MockClusterClient, container: &str) -> Option<String> {
        let deployment = client.deployment("shop", "web")?;
        let spec = deployment.spec?.template.spec?;
        let c = spec.containers.into_iter().find(|c| c.name == container)?;
        c.resources?.requests?.get("cpu").map(|q| q.0.clone())
    }

    #[tokio::test]
    async fn test_updates_request_and_writes_once() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", Some("500m"), Some("1"))]));

        let outcome = apply_reservation(&client, &web(), "web", Millicores(50), 0).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Updated);
        assert_eq!(template_request(&client, "web").as_deref(), Some("50m"));
        assert_eq!(
            client.writes(),
            vec![WriteCall::ReplaceDeployment {
                namespace: "shop".to_string(),
                name: "web".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_limit_is_left_alone() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", Some("500m"), Some("1"))]));

        apply_reservation(&client, &web(), "web", Millicores(50), 0).await.unwrap();

        let deployment = client.deployment("shop", "web").unwrap();
        let limits = deployment.spec.unwrap().template.spec.unwrap().containers[0]
            .resources
            .clone()
            .unwrap()
            .limits
            .unwrap();
        assert_eq!(limits.get("cpu").map(|q| q.0.as_str()), Some("1"));
    }

    #[tokio::test]
    async fn test_creates_missing_requests_map() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", None, Some("300m"))]));

        apply_reservation(&client, &web(), "web", Millicores(50), 0).await.unwrap();

        assert_eq!(template_request(&client, "web").as_deref(), Some("50m"));
    }

    #[tokio::test]
    async fn test_missing_container_is_not_created() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", Some("500m"), None)]));

        let outcome = apply_reservation(&client, &web(), "sidecar", Millicores(50), 0).await.unwrap();

        assert_eq!(outcome, MutationOutcome::ContainerNotFound);
        assert!(client.writes().is_empty());
        let spec = client.deployment("shop", "web").unwrap().spec.unwrap().template.spec.unwrap();
        assert_eq!(spec.containers.len(), 1);
    }

    #[tokio::test]
    async fn test_same_value_is_not_rewritten() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", Some("50m"), None)]));

        let outcome = apply_reservation(&client, &web(), "web", Millicores(50), 0).await.unwrap();

        assert_eq!(outcome, MutationOutcome::AlreadyApplied);
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_deployment_is_mutation_error() {
        let client = MockClusterClient::new();

        let result = apply_reservation(&client, &web(), "web", Millicores(50), 0).await;

        assert!(matches!(result, Err(RightsizerError::Mutation { ref workload, .. }) if *workload == web()));
    }

    #[tokio::test]
    async fn test_rejected_write_is_mutation_error() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", Some("500m"), None)]));
        client.fail_write("Deployment", "shop", "web");

        let result = apply_reservation(&client, &web(), "web", Millicores(50), 0).await;

        assert!(matches!(result, Err(RightsizerError::Mutation { .. })));
    }

    #[tokio::test]
    async fn test_conflict_without_retries_fails() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", Some("500m"), None)]));
        client.conflict_on_replace("shop", "web", 1);

        let result = apply_reservation(&client, &web(), "web", Millicores(50), 0).await;

        assert!(matches!(result, Err(RightsizerError::Mutation { ref source, .. }) if source.is_conflict()));
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_is_retried_when_enabled() {
        let client = MockClusterClient::new();
        client.add_deployment(test_deployment("shop", "web", vec![container("web", Some("500m"), None)]));
        client.conflict_on_replace("shop", "web", 2);

        let outcome = apply_reservation(&client, &web(), "web", Millicores(50), 2).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Updated);
        assert_eq!(client.writes().len(), 1);
        assert_eq!(template_request(&client, "web").as_deref(), Some("50m"));
    }
}
