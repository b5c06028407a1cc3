//! Pod operations for MockClusterClient

use super::{MockClusterClient, WriteCall};
use crate::common::object_ref;
use crate::error::ClusterError;
use k8s_openapi::api::core::v1::Pod;

fn matches(pod: &Pod, namespace: &str, name: &str) -> bool {
    pod.metadata.namespace.as_deref() == Some(namespace) && pod.metadata.name.as_deref() == Some(name)
}

pub async fn list_pods(client: &MockClusterClient) -> Result<Vec<Pod>, ClusterError> {
    if *client.fail_list.lock().unwrap() {
        return Err(ClusterError::Api("injected list failure".to_string()));
    }
    Ok(client.pods.lock().unwrap().clone())
}

pub async fn get_pod(client: &MockClusterClient, namespace: &str, name: &str) -> Result<Pod, ClusterError> {
    let reference = object_ref("Pod", namespace, name);
    client.check_get(&reference)?;
    client.pods
        .lock()
        .unwrap()
        .iter()
        .find(|p| matches(p, namespace, name))
        .cloned()
        .ok_or(ClusterError::NotFound(reference))
}

pub async fn delete_pod(client: &MockClusterClient, namespace: &str, name: &str) -> Result<(), ClusterError> {
    let reference = object_ref("Pod", namespace, name);
    client.check_write(&reference)?;
    let mut pods = client.pods.lock().unwrap();
    let before = pods.len();
    pods.retain(|p| !matches(p, namespace, name));
    if pods.len() == before {
        return Err(ClusterError::NotFound(reference));
    }
    drop(pods);

    client.record(WriteCall::DeletePod {
        namespace: namespace.to_string(),
        name: name.to_string(),
    });
    Ok(())
}
