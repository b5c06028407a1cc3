//! Shared helpers for building object references and owner summaries

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

/// Format an object reference as `Kind ns/name` for logs and errors
pub fn object_ref(kind: &str, namespace: &str, name: &str) -> String {
    format!("{} {}/{}", kind, namespace, name)
}

/// Pick the owner reference that controls an object.
///
/// Kubernetes marks at most one owner with `controller: true`. Objects created
/// by hand sometimes carry owners without the flag, so the first reference is
/// used when none is marked.
pub fn controller_owner(meta: &ObjectMeta) -> Option<&OwnerReference> {
    let owners = meta.owner_references.as_deref()?;
    owners
        .iter()
        .find(|owner| owner.controller == Some(true))
        .or_else(|| owners.first())
}
