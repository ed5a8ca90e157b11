//! In-memory [`ClusterApi`] used by unit tests.

use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Mutex;

use error_stack::Report;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use crate::config::WorkloadKind;
use crate::k8s::ClusterApi;
use crate::k8s::KubernetesError;
use crate::k8s::PodInfo;

/// A recorded call against the fake cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Selector {
        kind: WorkloadKind,
        namespace: String,
        name: String,
    },
    List {
        namespace: String,
        selector: String,
    },
    Evict {
        namespace: String,
        name: String,
    },
}

#[derive(Default)]
struct State {
    /// Answers for successive selector lookups. Exhausted means not found.
    selectors: VecDeque<Option<LabelSelector>>,
    /// Selector returned forever once `selectors` is exhausted.
    sticky_selector: Option<LabelSelector>,
    pods: Vec<PodInfo>,
    selector_fails: bool,
    list_fails: bool,
    /// Pod names whose eviction is refused.
    refused: HashSet<String>,
    /// Evicted pods disappear from later listings.
    remove_evicted: bool,
    calls: Vec<Call>,
}

#[derive(Default)]
pub(crate) struct FakeCluster {
    state: Mutex<State>,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue selector answers, one per lookup.
    pub(crate) fn with_selectors(self, selectors: Vec<Option<LabelSelector>>) -> Self {
        self.state.lock().unwrap().selectors = selectors.into();
        self
    }

    /// Answer every lookup with the same selector.
    pub(crate) fn with_sticky_selector(self, selector: LabelSelector) -> Self {
        self.state.lock().unwrap().sticky_selector = Some(selector);
        self
    }

    pub(crate) fn with_pods(self, pods: Vec<PodInfo>) -> Self {
        self.state.lock().unwrap().pods = pods;
        self
    }

    pub(crate) fn failing_selector(self) -> Self {
        self.state.lock().unwrap().selector_fails = true;
        self
    }

    pub(crate) fn failing_list(self) -> Self {
        self.state.lock().unwrap().list_fails = true;
        self
    }

    pub(crate) fn refusing(self, pod_name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .refused
            .insert(pod_name.to_string());
        self
    }

    pub(crate) fn removing_evicted(self) -> Self {
        self.state.lock().unwrap().remove_evicted = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn evicted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Evict { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn list_selectors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List { selector, .. } => Some(selector),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ClusterApi for FakeCluster {
    async fn workload_selector(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<LabelSelector>, Report<KubernetesError>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Selector {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });

        if state.selector_fails {
            return Err(Report::new(KubernetesError::WorkloadFetchFailed {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            }));
        }

        Ok(match state.selectors.pop_front() {
            Some(answer) => answer,
            None => state.sticky_selector.clone(),
        })
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<PodInfo>, Report<KubernetesError>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            namespace: namespace.to_string(),
            selector: selector.to_string(),
        });

        if state.list_fails {
            return Err(Report::new(KubernetesError::ListFailed {
                namespace: namespace.to_string(),
                selector: selector.to_string(),
            }));
        }

        Ok(state
            .pods
            .iter()
            .filter(|pod| pod.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn evict_pod(&self, namespace: &str, name: &str) -> Result<(), Report<KubernetesError>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Evict {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });

        if state.refused.contains(name) {
            return Err(Report::new(KubernetesError::EvictionFailed {
                pod_name: name.to_string(),
                namespace: namespace.to_string(),
            }));
        }

        if state.remove_evicted {
            state
                .pods
                .retain(|pod| !(pod.name == name && pod.namespace == namespace));
        }

        Ok(())
    }
}
