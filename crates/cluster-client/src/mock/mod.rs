//! Mock ClusterClient for unit testing
//!
//! This module provides a mock implementation of `ClusterClientTrait` that can
//! be used in unit tests without a running cluster.
//!
//! The mock is organized by API group:
//! - `pods.rs` - Pod operations
//! - `apps.rs` - ReplicaSet and Deployment operations, including the rollout
//!   simulation that a restart annotation triggers

mod apps;
mod pods;

use crate::error::ClusterError;
use crate::cluster_trait::ClusterClientTrait;
use crate::common::object_ref;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// A write the code under test issued against the mock
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCall {
    ReplaceDeployment { namespace: String, name: String },
    PatchDeployment { namespace: String, name: String, patch: serde_json::Value },
    DeletePod { namespace: String, name: String },
}

/// Mock ClusterClient for testing
///
/// Pods are kept in insertion order so that listing reproduces a stable
/// discovery order. Every write is appended to `writes()`.
#[derive(Debug, Clone, Default)]
pub struct MockClusterClient {
    pub(crate) pods: Arc<Mutex<Vec<Pod>>>,
    pub(crate) replica_sets: Arc<Mutex<HashMap<(String, String), ReplicaSet>>>,
    pub(crate) deployments: Arc<Mutex<HashMap<(String, String), Deployment>>>,
    pub(crate) writes: Arc<Mutex<Vec<WriteCall>>>,
    // Failure injection, keyed by `object_ref` strings
    pub(crate) fail_list: Arc<Mutex<bool>>,
    pub(crate) fail_gets: Arc<Mutex<HashSet<String>>>,
    pub(crate) fail_writes: Arc<Mutex<HashSet<String>>>,
    pub(crate) pending_conflicts: Arc<Mutex<HashMap<String, u32>>>,
    // Counter for resourceVersion values
    pub(crate) next_version: Arc<Mutex<u64>>,
}

impl MockClusterClient {
    /// Create an empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pod to the mock store (for test setup)
    pub fn add_pod(&self, pod: Pod) {
        self.pods.lock().unwrap().push(pod);
    }

    /// Add a ReplicaSet to the mock store (for test setup)
    pub fn add_replica_set(&self, replica_set: ReplicaSet) {
        let key = key_of(&replica_set.metadata);
        self.replica_sets.lock().unwrap().insert(key, replica_set);
    }

    /// Add a Deployment to the mock store (for test setup)
    pub fn add_deployment(&self, mut deployment: Deployment) {
        deployment.metadata.resource_version = Some(self.bump_version());
        let key = key_of(&deployment.metadata);
        self.deployments.lock().unwrap().insert(key, deployment);
    }

    /// Make `list_pods` fail with a transport-style error
    pub fn fail_list(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    /// Make reads of the given object fail with a non-404 error
    pub fn fail_get(&self, kind: &str, namespace: &str, name: &str) {
        self.fail_gets.lock().unwrap().insert(object_ref(kind, namespace, name));
    }

    /// Make writes (replace, patch, delete) of the given object fail
    pub fn fail_write(&self, kind: &str, namespace: &str, name: &str) {
        self.fail_writes.lock().unwrap().insert(object_ref(kind, namespace, name));
    }

    /// Simulate `times` concurrent edits: the next `times` replaces of the
    /// Deployment bump its version first and are rejected with a conflict.
    pub fn conflict_on_replace(&self, namespace: &str, name: &str, times: u32) {
        self.pending_conflicts
            .lock()
            .unwrap()
            .insert(object_ref("Deployment", namespace, name), times);
    }

    /// All writes issued so far, in order
    pub fn writes(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    /// Current stored copy of a Deployment
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.deployments
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Current stored copy of a pod
    pub fn pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        self.pods
            .lock()
            .unwrap()
            .iter()
            .find(|p| {
                p.metadata.namespace.as_deref() == Some(namespace)
                    && p.metadata.name.as_deref() == Some(name)
            })
            .cloned()
    }

    pub(crate) fn record(&self, call: WriteCall) {
        self.writes.lock().unwrap().push(call);
    }

    pub(crate) fn check_get(&self, reference: &str) -> Result<(), ClusterError> {
        if self.fail_gets.lock().unwrap().contains(reference) {
            return Err(ClusterError::Api(format!("injected read failure for {}", reference)));
        }
        Ok(())
    }

    pub(crate) fn check_write(&self, reference: &str) -> Result<(), ClusterError> {
        if self.fail_writes.lock().unwrap().contains(reference) {
            return Err(ClusterError::Api(format!("injected write failure for {}", reference)));
        }
        Ok(())
    }

    pub(crate) fn bump_version(&self) -> String {
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        version.to_string()
    }
}

pub(crate) fn key_of(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> (String, String) {
    (
        meta.namespace.clone().unwrap_or_else(|| "default".to_string()),
        meta.name.clone().unwrap_or_default(),
    )
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn list_pods(&self) -> Result<Vec<Pod>, ClusterError> {
        pods::list_pods(self).await
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, ClusterError> {
        pods::get_pod(self, namespace, name).await
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        pods::delete_pod(self, namespace, name).await
    }

    async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClusterError> {
        apps::get_replica_set(self, namespace, name).await
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        apps::get_deployment(self, namespace, name).await
    }

    async fn replace_deployment(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        apps::replace_deployment(self, namespace, name, deployment).await
    }

    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, ClusterError> {
        apps::patch_deployment(self, namespace, name, patch).await
    }
}
