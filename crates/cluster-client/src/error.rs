//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes control plane
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Transport, authentication or API server error from kube
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because the object changed since it was read
    #[error("Conflict: {0}")]
    Conflict(String),

    /// API call failed in a way that is not otherwise classified
    #[error("Cluster API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClusterError {
    /// Classify a kube error for the object described by `what`.
    ///
    /// 404 and 409 responses become `NotFound` and `Conflict` so callers can
    /// branch on them without inspecting status codes.
    pub fn from_kube(err: kube::Error, what: &str) -> Self {
        match &err {
            kube::Error::Api(response) if response.code == 404 => {
                ClusterError::NotFound(what.to_string())
            }
            kube::Error::Api(response) if response.code == 409 => {
                ClusterError::Conflict(format!("{}: {}", what, response.message))
            }
            _ => ClusterError::Kube(err),
        }
    }

    /// True for the errors a caller should treat as "object missing".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }

    /// True when a write lost an optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClusterError::Conflict(_))
    }
}
