//! Pod age evaluation.
//!
//! Candidates keep the order of the pod listing. Eviction is therefore not
//! oldest-first.

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use tracing::debug;
use tracing::warn;

use crate::k8s::ClusterApi;
use crate::k8s::PodInfo;

/// A running pod that outlived its target's max life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodCandidate {
    pub name: String,
    pub namespace: String,
    pub age: Duration,
}

/// List the pods behind `selector` and keep those older than `max_life`.
///
/// A failed listing is logged and yields no candidates; the loop carries on
/// and lists again on its next iteration.
pub async fn find_candidates<C>(
    cluster: &C,
    namespace: &str,
    selector: &str,
    max_life: Duration,
    now: DateTime<Utc>,
) -> Vec<PodCandidate>
where
    C: ClusterApi + ?Sized,
{
    match cluster.list_pods(namespace, selector).await {
        Ok(pods) => {
            debug!(count = pods.len(), "listed pods");
            select_candidates(&pods, max_life, now)
        }
        Err(e) => {
            warn!("Failed to list pods, treating as no candidates: {e:?}");
            Vec::new()
        }
    }
}

/// Keep running pods whose age at `now` is strictly greater than `max_life`.
pub fn select_candidates(
    pods: &[PodInfo],
    max_life: Duration,
    now: DateTime<Utc>,
) -> Vec<PodCandidate> {
    pods.iter()
        .filter(|pod| pod.is_running())
        .filter_map(|pod| {
            let age = pod_age(pod, now)?;
            (age > max_life).then(|| PodCandidate {
                name: pod.name.clone(),
                namespace: pod.namespace.clone(),
                age,
            })
        })
        .collect()
}

/// Age of a started pod. Start times in the future count as no age.
fn pod_age(pod: &PodInfo, now: DateTime<Utc>) -> Option<Duration> {
    let start_time = pod.start_time?;
    (now - start_time).to_std().ok()
}
