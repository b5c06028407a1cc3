//! Kubernetes Control-Plane Client
//!
//! The narrow slice of the Kubernetes API the CPU rightsizer needs: listing
//! pods cluster-wide, walking owner references through ReplicaSets to
//! Deployments, replacing and patching Deployments, and deleting pods.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClient, ClusterClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClusterClient::try_default().await?;
//!
//! let pods = client.list_pods().await?;
//! println!("{} pods in the cluster", pods.len());
//!
//! let deployment = client.get_deployment("default", "web").await?;
//! client.replace_deployment("default", "web", &deployment).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Unit tests use `MockClusterClient` (feature `test-util`), an in-memory
//! store that records every write.

pub mod client;
pub mod common;
pub mod error;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::ClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use common::{controller_owner, object_ref};
pub use error::ClusterError;
#[cfg(feature = "test-util")]
pub use mock::{MockClusterClient, WriteCall};
