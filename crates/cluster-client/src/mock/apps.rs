//! Apps (v1) operations for MockClusterClient
//!
//! Handles ReplicaSets and Deployments. A merge patch that touches the pod
//! template stands in for the platform's rollout: pods owned by the
//! Deployment (directly or through one of its ReplicaSets) pick up the
//! template's container resources.

use super::{MockClusterClient, WriteCall};
use crate::common::{controller_owner, object_ref};
use crate::error::ClusterError;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;

pub async fn get_replica_set(client: &MockClusterClient, namespace: &str, name: &str) -> Result<ReplicaSet, ClusterError> {
    let reference = object_ref("ReplicaSet", namespace, name);
    client.check_get(&reference)?;
    client.replica_sets
        .lock()
        .unwrap()
        .get(&(namespace.to_string(), name.to_string()))
        .cloned()
        .ok_or(ClusterError::NotFound(reference))
}

pub async fn get_deployment(client: &MockClusterClient, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
    let reference = object_ref("Deployment", namespace, name);
    client.check_get(&reference)?;
    client.deployments
        .lock()
        .unwrap()
        .get(&(namespace.to_string(), name.to_string()))
        .cloned()
        .ok_or(ClusterError::NotFound(reference))
}

pub async fn replace_deployment(
    client: &MockClusterClient,
    namespace: &str,
    name: &str,
    deployment: &Deployment,
) -> Result<Deployment, ClusterError> {
    let reference = object_ref("Deployment", namespace, name);
    client.check_write(&reference)?;
    let key = (namespace.to_string(), name.to_string());

    // A pending conflict models someone else writing between our read and write
    {
        let mut pending = client.pending_conflicts.lock().unwrap();
        if let Some(remaining) = pending.get_mut(&reference) {
            if *remaining > 0 {
                *remaining -= 1;
                let version = client.bump_version();
                if let Some(stored) = client.deployments.lock().unwrap().get_mut(&key) {
                    stored.metadata.resource_version = Some(version);
                }
            }
        }
    }

    let mut deployments = client.deployments.lock().unwrap();
    let stored = deployments
        .get(&key)
        .ok_or_else(|| ClusterError::NotFound(reference.clone()))?;

    if let Some(sent) = deployment.metadata.resource_version.as_deref() {
        if stored.metadata.resource_version.as_deref() != Some(sent) {
            return Err(ClusterError::Conflict(format!(
                "{}: the object has been modified; please apply your changes to the latest version",
                reference
            )));
        }
    }

    let mut updated = deployment.clone();
    updated.metadata.resource_version = Some(client.bump_version());
    deployments.insert(key, updated.clone());
    drop(deployments);

    client.record(WriteCall::ReplaceDeployment {
        namespace: namespace.to_string(),
        name: name.to_string(),
    });
    Ok(updated)
}

pub async fn patch_deployment(
    client: &MockClusterClient,
    namespace: &str,
    name: &str,
    patch: &serde_json::Value,
) -> Result<Deployment, ClusterError> {
    let reference = object_ref("Deployment", namespace, name);
    client.check_write(&reference)?;
    let key = (namespace.to_string(), name.to_string());

    let current = client.deployments
        .lock()
        .unwrap()
        .get(&key)
        .cloned()
        .ok_or_else(|| ClusterError::NotFound(reference.clone()))?;

    let mut document = serde_json::to_value(&current)?;
    merge_patch(&mut document, patch);
    let mut patched: Deployment = serde_json::from_value(document)?;
    patched.metadata.resource_version = Some(client.bump_version());

    client.deployments.lock().unwrap().insert(key, patched.clone());
    client.record(WriteCall::PatchDeployment {
        namespace: namespace.to_string(),
        name: name.to_string(),
        patch: patch.clone(),
    });

    let touches_template = patch
        .get("spec")
        .and_then(|spec| spec.get("template"))
        .is_some();
    if touches_template {
        roll_out(client, namespace, name, &patched);
    }

    Ok(patched)
}

/// JSON merge patch (RFC 7386)
fn merge_patch(target: &mut serde_json::Value, patch: &serde_json::Value) {
    let Some(patch_fields) = patch.as_object() else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = serde_json::Value::Object(serde_json::Map::new());
    }
    if let Some(target_fields) = target.as_object_mut() {
        for (field, value) in patch_fields {
            if value.is_null() {
                target_fields.remove(field);
            } else {
                merge_patch(
                    target_fields.entry(field.clone()).or_insert(serde_json::Value::Null),
                    value,
                );
            }
        }
    }
}

fn owned_by_deployment(client: &MockClusterClient, pod: &Pod, namespace: &str, deployment: &str) -> bool {
    let Some(owner) = controller_owner(&pod.metadata) else {
        return false;
    };
    match owner.kind.as_str() {
        "Deployment" => owner.name == deployment,
        "ReplicaSet" => client.replica_sets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), owner.name.clone()))
            .and_then(|rs| controller_owner(&rs.metadata).cloned())
            .is_some_and(|rs_owner| rs_owner.kind == "Deployment" && rs_owner.name == deployment),
        _ => false,
    }
}

fn roll_out(client: &MockClusterClient, namespace: &str, name: &str, deployment: &Deployment) {
    let Some(template) = deployment.spec.as_ref().and_then(|s| s.template.spec.as_ref()) else {
        return;
    };

    let owned: Vec<usize> = {
        let pods = client.pods.lock().unwrap();
        pods.iter()
            .enumerate()
            .filter(|(_, pod)| pod.metadata.namespace.as_deref() == Some(namespace))
            .filter(|(_, pod)| owned_by_deployment(client, pod, namespace, name))
            .map(|(index, _)| index)
            .collect()
    };

    let mut pods = client.pods.lock().unwrap();
    for index in owned {
        let Some(spec) = pods[index].spec.as_mut() else {
            continue;
        };
        for container in spec.containers.iter_mut() {
            if let Some(desired) = template.containers.iter().find(|c| c.name == container.name) {
                container.resources = desired.resources.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::merge_patch;
    use serde_json::json;

    #[test]
    fn test_merge_patch_adds_nested_fields() {
        let mut doc = json!({"spec": {"replicas": 2, "template": {"metadata": {}}}});
        merge_patch(&mut doc, &json!({"spec": {"template": {"metadata": {"annotations": {"a": "b"}}}}}));
        assert_eq!(doc, json!({"spec": {"replicas": 2, "template": {"metadata": {"annotations": {"a": "b"}}}}}));
    }

    #[test]
    fn test_merge_patch_null_removes_field() {
        let mut doc = json!({"metadata": {"labels": {"a": "1", "b": "2"}}});
        merge_patch(&mut doc, &json!({"metadata": {"labels": {"a": null}}}));
        assert_eq!(doc, json!({"metadata": {"labels": {"b": "2"}}}));
    }
}
