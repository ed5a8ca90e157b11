//! Per-target monitoring loop.
//!
//! ```text
//! Resolving -> Listing -> Evicting -> Sleeping -> Resolving ...
//!     |                       |           |
//!     +-----------------------+-----------+--> Terminated
//! ```
//!
//! A loop terminates when its selector cannot be resolved, after its single
//! pass in batch mode, or when shutdown is requested while it sleeps.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use crate::config::GlobalConfig;
use crate::config::TargetSpec;
use crate::evaluator::find_candidates;
use crate::evaluator::PodCandidate;
use crate::executor::evict_candidates;
use crate::executor::EvictionPolicy;
use crate::k8s::ClusterApi;
use crate::selector::resolve_selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Unsupported kind, missing workload or unusable selector.
    SelectorUnavailable,
    /// Batch mode finished its single pass.
    BatchComplete,
    /// Shutdown was requested.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Resolving,
    Listing { selector: String },
    Evicting { candidates: Vec<PodCandidate> },
    Sleeping,
    Terminated(StopReason),
}

/// What a loop did before terminating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    /// `namespace kind/name` of the target.
    pub target: String,
    /// Completed Resolving..Evicting passes.
    pub iterations: u64,
    /// Evicted pods, simulated ones included.
    pub evicted: u64,
    pub reason: StopReason,
}

pub struct TargetLoop<C: ?Sized> {
    cluster: Arc<C>,
    target: TargetSpec,
    policy: EvictionPolicy,
    batch_mode: bool,
    shutdown: CancellationToken,
    iterations: u64,
    evicted: u64,
}

impl<C> TargetLoop<C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(
        cluster: Arc<C>,
        target: TargetSpec,
        config: &GlobalConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let policy = EvictionPolicy {
            dry_run: config.dry_run,
            batch_max_kill: target.batch_max_kill,
        };

        Self {
            cluster,
            target,
            policy,
            batch_mode: config.batch_mode,
            shutdown,
            iterations: 0,
            evicted: 0,
        }
    }

    /// Drive the loop until it reaches [`LoopState::Terminated`].
    #[tracing::instrument(skip(self), fields(
        kind = %self.target.kind,
        namespace = %self.target.namespace,
        name = %self.target.name,
    ))]
    pub async fn run(mut self) -> LoopSummary {
        info!(
            "Loop started. Will evict pods older than {}, interval {}",
            humantime::format_duration(self.target.max_life),
            humantime::format_duration(self.target.interval),
        );

        let mut state = LoopState::Resolving;
        let reason = loop {
            state = match state {
                LoopState::Terminated(reason) => break reason,
                state => self.step(state).await,
            };
        };

        info!(
            iterations = self.iterations,
            evicted = self.evicted,
            ?reason,
            "Loop stopped"
        );

        LoopSummary {
            target: self.target.to_string(),
            iterations: self.iterations,
            evicted: self.evicted,
            reason,
        }
    }

    /// Perform the work of `state` and return the next state.
    pub async fn step(&mut self, state: LoopState) -> LoopState {
        match state {
            LoopState::Resolving => match resolve_selector(&*self.cluster, &self.target).await {
                Ok(selector) => LoopState::Listing { selector },
                Err(e) => {
                    warn!("Selector unavailable, monitoring stops: {e:?}");
                    LoopState::Terminated(StopReason::SelectorUnavailable)
                }
            },
            LoopState::Listing { selector } => {
                let candidates = find_candidates(
                    &*self.cluster,
                    &self.target.namespace,
                    &selector,
                    self.target.max_life,
                    Utc::now(),
                )
                .await;
                LoopState::Evicting { candidates }
            }
            LoopState::Evicting { candidates } => {
                let killed = evict_candidates(&*self.cluster, &candidates, self.policy).await;
                self.iterations += 1;
                self.evicted += killed;
                info!("This loop evicted {killed} pod(s)");

                if self.batch_mode {
                    info!("Batch mode enabled, exit after run");
                    LoopState::Terminated(StopReason::BatchComplete)
                } else {
                    LoopState::Sleeping
                }
            }
            LoopState::Sleeping => {
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => LoopState::Terminated(StopReason::Shutdown),
                    _ = tokio::time::sleep(self.target.interval) => LoopState::Resolving,
                }
            }
            LoopState::Terminated(reason) => LoopState::Terminated(reason),
        }
    }
}
