use chrono::DateTime;
use chrono::Utc;
use k8s_openapi::api::core::v1::Pod;
use thiserror::Error;

pub const POD_PHASE_RUNNING: &str = "Running";

/// Pod fields relevant to lifetime enforcement.
#[derive(Debug, Clone, PartialEq)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub phase: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

impl PodInfo {
    pub fn is_running(&self) -> bool {
        self.phase.as_deref() == Some(POD_PHASE_RUNNING)
    }

    /// Build from a listed pod. `namespace` is used when the object carries none.
    pub fn from_pod(pod: Pod, namespace: &str) -> Self {
        let metadata = pod.metadata;
        let status = pod.status.unwrap_or_default();

        Self {
            name: metadata.name.unwrap_or_default(),
            namespace: metadata.namespace.unwrap_or_else(|| namespace.to_string()),
            phase: status.phase,
            start_time: status.start_time.map(|time| time.0),
        }
    }
}

/// Errors that can occur during Kubernetes operations.
#[derive(Debug, Error)]
pub enum KubernetesError {
    #[error("Failed to connect to Kubernetes API: {message}")]
    ConnectionFailed { message: String },
    #[error("Failed to get {kind} {namespace}/{name}")]
    WorkloadFetchFailed {
        kind: String,
        namespace: String,
        name: String,
    },
    #[error("Failed to list pods in namespace {namespace} with selector '{selector}'")]
    ListFailed { namespace: String, selector: String },
    #[error("Failed to evict pod {pod_name} in namespace {namespace}")]
    EvictionFailed { pod_name: String, namespace: String },
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::PodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn from_pod_extracts_status() {
        let started = Utc::now();
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("api-7d9f".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                start_time: Some(Time(started)),
                ..Default::default()
            }),
        };

        let info = PodInfo::from_pod(pod, "ignored");
        assert_eq!(
            info,
            PodInfo {
                name: "api-7d9f".to_string(),
                namespace: "ns1".to_string(),
                phase: Some("Running".to_string()),
                start_time: Some(started),
            }
        );
        assert!(info.is_running());
    }

    #[test]
    fn from_pod_without_status() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("pending".to_string()),
                ..Default::default()
            },
            spec: None,
            status: None,
        };

        let info = PodInfo::from_pod(pod, "fallback");
        assert_eq!(info.namespace, "fallback");
        assert_eq!(info.start_time, None);
        assert!(!info.is_running());
    }
}
