use std::fmt::Debug;

use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::NamespaceResourceScope;
use kube::api::EvictParams;
use kube::api::ListParams;
use kube::Api;
use kube::Client;
use kube::Resource;
use serde::de::DeserializeOwned;

use crate::config::WorkloadKind;
use crate::k8s::KubernetesError;
use crate::k8s::PodInfo;

/// The cluster operations lifetime enforcement depends on.
///
/// One handle is shared by every target loop, so implementations must be
/// safe for concurrent use.
#[async_trait::async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch the pod selector of a workload controller.
    ///
    /// Returns `Ok(None)` when the controller does not exist.
    async fn workload_selector(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<LabelSelector>, Report<KubernetesError>>;

    /// List pods in `namespace` matching a rendered label selector.
    async fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<PodInfo>, Report<KubernetesError>>;

    /// Request a policy-respecting eviction of a pod.
    async fn evict_pod(&self, namespace: &str, name: &str) -> Result<(), Report<KubernetesError>>;
}

/// [`ClusterApi`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_workload<K>(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<K>, Report<KubernetesError>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .change_context(KubernetesError::WorkloadFetchFailed {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl ClusterApi for KubeCluster {
    async fn workload_selector(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<LabelSelector>, Report<KubernetesError>> {
        let selector = match kind {
            WorkloadKind::DaemonSet => self
                .get_workload::<DaemonSet>(kind, namespace, name)
                .await?
                .and_then(|ds| ds.spec)
                .map(|spec| spec.selector),
            WorkloadKind::Deployment => self
                .get_workload::<Deployment>(kind, namespace, name)
                .await?
                .and_then(|deploy| deploy.spec)
                .map(|spec| spec.selector),
            WorkloadKind::StatefulSet => self
                .get_workload::<StatefulSet>(kind, namespace, name)
                .await?
                .and_then(|sts| sts.spec)
                .map(|spec| spec.selector),
        };

        Ok(selector)
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<PodInfo>, Report<KubernetesError>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(selector);
        }

        let pods = api
            .list(&params)
            .await
            .change_context(KubernetesError::ListFailed {
                namespace: namespace.to_string(),
                selector: selector.to_string(),
            })?;

        Ok(pods
            .items
            .into_iter()
            .map(|pod| PodInfo::from_pod(pod, namespace))
            .collect())
    }

    async fn evict_pod(&self, namespace: &str, name: &str) -> Result<(), Report<KubernetesError>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        api.evict(name, &EvictParams::default())
            .await
            .change_context(KubernetesError::EvictionFailed {
                pod_name: name.to_string(),
                namespace: namespace.to_string(),
            })?;

        Ok(())
    }
}
