//! Integration tests for the cluster client
//!
//! These tests require a reachable cluster through the ambient kubeconfig.
//! Set RIGHTSIZER_TEST_NAMESPACE and RIGHTSIZER_TEST_DEPLOYMENT to name a
//! disposable Deployment for the write tests.

use cluster_client::{ClusterClient, ClusterClientTrait, controller_owner};

fn test_target() -> (String, String) {
    let namespace = std::env::var("RIGHTSIZER_TEST_NAMESPACE")
        .unwrap_or_else(|_| "default".to_string());
    let deployment = std::env::var("RIGHTSIZER_TEST_DEPLOYMENT")
        .expect("RIGHTSIZER_TEST_DEPLOYMENT environment variable must be set");
    (namespace, deployment)
}

#[tokio::test]
#[ignore] // Requires a running cluster
async fn test_list_pods() {
    let client = ClusterClient::try_default().await.expect("Failed to create client");

    let pods = client.list_pods().await.expect("Failed to list pods");

    println!("Found {} pods", pods.len());
}

#[tokio::test]
#[ignore]
async fn test_owner_chain_of_listed_pods() {
    let client = ClusterClient::try_default().await.expect("Failed to create client");

    let pods = client.list_pods().await.expect("Failed to list pods");
    for pod in pods.iter().take(20) {
        let (Some(namespace), Some(name)) = (pod.metadata.namespace.as_deref(), pod.metadata.name.as_deref()) else {
            continue;
        };
        let Some(owner) = controller_owner(&pod.metadata) else {
            println!("{}/{} has no owner", namespace, name);
            continue;
        };
        if owner.kind == "ReplicaSet" {
            let rs = client.get_replica_set(namespace, &owner.name).await
                .expect("Failed to read ReplicaSet");
            let parent = controller_owner(&rs.metadata).map(|o| o.kind.clone());
            println!("{}/{} -> ReplicaSet {} -> {:?}", namespace, name, owner.name, parent);
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_missing_deployment_is_not_found() {
    let client = ClusterClient::try_default().await.expect("Failed to create client");

    let result = client.get_deployment("default", "rightsizer-does-not-exist").await;

    assert!(matches!(result, Err(ref e) if e.is_not_found()));
}

#[tokio::test]
#[ignore]
async fn test_replace_deployment_unchanged() {
    let (namespace, name) = test_target();
    let client = ClusterClient::try_default().await.expect("Failed to create client");

    let deployment = client.get_deployment(&namespace, &name).await
        .expect("Failed to read deployment");
    let replaced = client.replace_deployment(&namespace, &name, &deployment).await
        .expect("Failed to replace deployment");

    assert_eq!(replaced.metadata.name, deployment.metadata.name);
}

#[tokio::test]
#[ignore]
async fn test_stale_replace_conflicts() {
    let (namespace, name) = test_target();
    let client = ClusterClient::try_default().await.expect("Failed to create client");

    let mut stale = client.get_deployment(&namespace, &name).await
        .expect("Failed to read deployment");
    stale.metadata.resource_version = Some("1".to_string());

    let result = client.replace_deployment(&namespace, &name, &stale).await;

    assert!(matches!(result, Err(ref e) if e.is_conflict()));
}

#[tokio::test]
#[ignore]
async fn test_client_debug_names_default_namespace() {
    let client = ClusterClient::try_default().await.expect("Failed to create client");

    let printed = format!("{:?}", client);

    assert!(printed.starts_with("ClusterClient"));
    assert!(printed.contains("default_namespace"));
}
