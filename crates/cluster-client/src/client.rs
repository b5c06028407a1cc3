//! Kubernetes API client
//!
//! Implements `ClusterClientTrait` on top of `kube::Api` for Pods,
//! ReplicaSets and Deployments.

use crate::error::ClusterError;
use crate::common::object_ref;
use crate::cluster_trait::ClusterClientTrait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use std::fmt;
use tracing::debug;

/// Kubernetes control-plane client
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
}

impl fmt::Debug for ClusterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterClient")
            .field("default_namespace", &self.client.default_namespace())
            .finish_non_exhaustive()
    }
}

impl ClusterClient {
    /// Create a client from the ambient kubeconfig or in-cluster service account.
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Wrap an already configured `kube::Client`
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn replica_sets(&self, namespace: &str) -> Api<ReplicaSet> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for ClusterClient {
    async fn list_pods(&self) -> Result<Vec<Pod>, ClusterError> {
        debug!("Listing pods in all namespaces");
        let api: Api<Pod> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, "pods (all namespaces)"))?;
        debug!("Listed {} pods", list.items.len());
        Ok(list.items)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, ClusterError> {
        debug!("Reading Pod {}/{}", namespace, name);
        self.pods(namespace)
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, &object_ref("Pod", namespace, name)))
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        debug!("Deleting Pod {}/{}", namespace, name);
        self.pods(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, &object_ref("Pod", namespace, name)))?;
        Ok(())
    }

    async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClusterError> {
        debug!("Reading ReplicaSet {}/{}", namespace, name);
        self.replica_sets(namespace)
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, &object_ref("ReplicaSet", namespace, name)))
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        debug!("Reading Deployment {}/{}", namespace, name);
        self.deployments(namespace)
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, &object_ref("Deployment", namespace, name)))
    }

    async fn replace_deployment(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        debug!("Replacing Deployment {}/{}", namespace, name);
        self.deployments(namespace)
            .replace(name, &PostParams::default(), deployment)
            .await
            .map_err(|e| ClusterError::from_kube(e, &object_ref("Deployment", namespace, name)))
    }

    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, ClusterError> {
        debug!("Patching Deployment {}/{}", namespace, name);
        self.deployments(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| ClusterError::from_kube(e, &object_ref("Deployment", namespace, name)))
    }
}
