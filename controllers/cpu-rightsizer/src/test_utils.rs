//! Test utilities for building pods, ReplicaSets and Deployments
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, ReplicaSet};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodTemplateSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::collections::BTreeMap;

fn cpu(value: Option<&str>) -> Option<BTreeMap<String, Quantity>> {
    value.map(|v| BTreeMap::from([("cpu".to_string(), Quantity(v.to_string()))]))
}

fn owner_ref(kind: &str, name: &str) -> OwnerReference {
    let api_version = if kind == "ReplicaSet" || kind == "Deployment" || kind == "StatefulSet" {
        "apps/v1"
    } else {
        "v1"
    };
    OwnerReference {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        uid: format!("uid-{}", name),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

fn meta(namespace: &str, name: &str, owner: Option<(&str, &str)>, labels: Option<&[(&str, &str)]>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        owner_references: owner.map(|(kind, owner_name)| vec![owner_ref(kind, owner_name)]),
        labels: labels.map(|pairs| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }),
        ..Default::default()
    }
}

/// Helper to create a container with optional CPU request and limit
pub fn container(name: &str, request: Option<&str>, limit: Option<&str>) -> Container {
    let resources = if request.is_none() && limit.is_none() {
        None
    } else {
        Some(ResourceRequirements {
            requests: cpu(request),
            limits: cpu(limit),
            ..Default::default()
        })
    };
    Container {
        name: name.to_string(),
        image: Some("registry.local/app:1.0".to_string()),
        resources,
        ..Default::default()
    }
}

/// Helper to create a pod with several containers
pub fn pod_with_containers(
    namespace: &str,
    name: &str,
    containers: Vec<Container>,
    owner: Option<(&str, &str)>,
    labels: Option<&[(&str, &str)]>,
) -> Pod {
    Pod {
        metadata: meta(namespace, name, owner, labels),
        spec: Some(PodSpec {
            containers,
            ..Default::default()
        }),
        status: None,
    }
}

/// Helper to create a single-container pod with an optional CPU request
pub fn test_pod(
    namespace: &str,
    name: &str,
    container_name: &str,
    request: Option<&str>,
    owner: Option<(&str, &str)>,
    labels: Option<&[(&str, &str)]>,
) -> Pod {
    pod_with_containers(namespace, name, vec![container(container_name, request, None)], owner, labels)
}

/// Helper to create a ReplicaSet with an optional owner
pub fn test_replica_set(namespace: &str, name: &str, owner: Option<(&str, &str)>) -> ReplicaSet {
    ReplicaSet {
        metadata: meta(namespace, name, owner, None),
        ..Default::default()
    }
}

/// Helper to create a Deployment whose template holds `containers`
pub fn test_deployment(namespace: &str, name: &str, containers: Vec<Container>) -> Deployment {
    Deployment {
        metadata: meta(namespace, name, None, None),
        spec: Some(DeploymentSpec {
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(BTreeMap::from([("app".to_string(), name.to_string())])),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers,
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}
