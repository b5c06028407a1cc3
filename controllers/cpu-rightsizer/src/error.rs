//! Rightsizer error types.
//!
//! Per-candidate failures (`Lookup`, `Mutation`, `Restart`, `Terminate`) are
//! logged and recorded in the run summary; only scan, configuration and console
//! failures end the run.

use crate::ownership::WorkloadRef;
use crate::quantity::QuantityError;
use cluster_client::ClusterError;
use thiserror::Error;

/// Errors that can occur during a rightsizing run.
#[derive(Debug, Error)]
pub enum RightsizerError {
    /// Cluster API call failed and nothing more specific applies
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// CPU quantity text could not be parsed
    #[error("Malformed CPU quantity: {0}")]
    Quantity(#[from] QuantityError),

    /// Ownership chain object missing or unreadable
    #[error("Ownership lookup failed: {0}")]
    Lookup(String),

    /// Workload update rejected by the control plane
    #[error("Failed to update {workload}: {source}")]
    Mutation {
        workload: WorkloadRef,
        #[source]
        source: ClusterError,
    },

    /// Restart annotation could not be applied
    #[error("Failed to restart {workload}: {source}")]
    Restart {
        workload: WorkloadRef,
        #[source]
        source: ClusterError,
    },

    /// Pod could not be deleted
    #[error("Failed to delete Pod {namespace}/{pod}: {source}")]
    Terminate {
        namespace: String,
        pod: String,
        #[source]
        source: ClusterError,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operator console could not be read or written
    #[error("Console I/O failed: {0}")]
    Console(#[from] std::io::Error),
}
