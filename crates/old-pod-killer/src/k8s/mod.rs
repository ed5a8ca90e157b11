//! Kubernetes integration module.
//!
//! The rest of the crate talks to the cluster only through [`ClusterApi`]:
//! - [`KubeCluster`]: the `kube` backed implementation
//! - [`init_kube_client`]: builds the shared client handle at startup
//! - [`PodInfo`]: the slice of a pod the age evaluation needs

pub mod client;
pub mod cluster;
#[cfg(test)]
pub(crate) mod fake;
pub mod types;

pub use client::init_kube_client;
pub use cluster::ClusterApi;
pub use cluster::KubeCluster;
pub use types::KubernetesError;
pub use types::PodInfo;
