use std::time::Duration;

use tracing::info;
use tracing::warn;

use crate::evaluator::PodCandidate;
use crate::k8s::ClusterApi;

/// How one iteration's candidates are acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Count candidates as evicted without calling the API.
    pub dry_run: bool,
    /// Stop after this many evictions, 0 for no limit.
    pub batch_max_kill: u64,
}

impl EvictionPolicy {
    fn cap_reached(&self, killed: u64) -> bool {
        self.batch_max_kill > 0 && killed >= self.batch_max_kill
    }
}

/// Drop the sub-second part so logged ages stay readable.
fn whole_seconds(age: Duration) -> Duration {
    Duration::from_secs(age.as_secs())
}

/// Evict candidates in order and return how many were evicted.
///
/// Simulated evictions in dry-run mode are counted too. The first refused
/// eviction ends the batch: the rest is retried on the next iteration.
pub async fn evict_candidates<C>(
    cluster: &C,
    candidates: &[PodCandidate],
    policy: EvictionPolicy,
) -> u64
where
    C: ClusterApi + ?Sized,
{
    let mut killed = 0;

    for candidate in candidates {
        if policy.cap_reached(killed) {
            break;
        }

        if policy.dry_run {
            info!(
                pod = %candidate.name,
                namespace = %candidate.namespace,
                age = %humantime::format_duration(whole_seconds(candidate.age)),
                "Dry run, pod would be evicted"
            );
        } else {
            if let Err(e) = cluster
                .evict_pod(&candidate.namespace, &candidate.name)
                .await
            {
                // a refusal (usually a disruption budget) applies to the rest of the batch too
                warn!("Can't evict pod '{}', stopping this batch: {e:?}", candidate.name);
                break;
            }
            info!(
                pod = %candidate.name,
                namespace = %candidate.namespace,
                age = %humantime::format_duration(whole_seconds(candidate.age)),
                "Evicted pod"
            );
        }

        killed += 1;
    }

    killed
}
