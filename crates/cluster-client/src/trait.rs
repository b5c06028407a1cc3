//! ClusterClient trait for mocking
//!
//! This trait abstracts the control-plane calls the rightsizer makes so the
//! reconciliation phases can run against an in-memory mock in unit tests.
//! The concrete `ClusterClient` implements it on top of `kube::Api`.

use crate::error::ClusterError;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;

/// Trait for Kubernetes control-plane operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// List every pod across all namespaces
    async fn list_pods(&self) -> Result<Vec<Pod>, ClusterError>;

    /// Read a single pod
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, ClusterError>;

    /// Delete a pod so that its controller recreates it
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    /// Read a ReplicaSet
    async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClusterError>;

    /// Read a Deployment
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError>;

    /// Replace a Deployment with a full object.
    ///
    /// The object's `metadata.resourceVersion` is sent along, so a stale
    /// object is rejected with `ClusterError::Conflict`.
    async fn replace_deployment(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError>;

    /// Apply a JSON merge patch to a Deployment
    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, ClusterError>;
}
