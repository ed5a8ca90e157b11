use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::GlobalConfig;
use crate::k8s::ClusterApi;
use crate::target_loop::LoopSummary;
use crate::target_loop::TargetLoop;

/// Runs one [`TargetLoop`] per configured target and joins them all.
///
/// Loops share the read-only configuration and the cluster handle, nothing
/// else. Targets with overlapping selectors are not deduplicated.
pub struct Coordinator<C: ?Sized> {
    cluster: Arc<C>,
    config: Arc<GlobalConfig>,
    cancellation_token: CancellationToken,
}

impl<C> Coordinator<C>
where
    C: ClusterApi + ?Sized + 'static,
{
    pub fn new(cluster: Arc<C>, config: Arc<GlobalConfig>) -> Self {
        Self {
            cluster,
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Token that stops every loop at its next sleep once cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Start every target loop and wait until all of them terminated.
    ///
    /// Summaries come back in target order. A loop that panicked is logged
    /// and left out.
    pub async fn run(&self) -> Vec<LoopSummary> {
        let tasks = self.spawn_all();
        tracing::info!("Started {} target loop(s)", tasks.len());

        let (targets, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        targets
            .into_iter()
            .zip(results)
            .filter_map(|(target, result)| match result {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::error!("Loop for {target} failed: {e}");
                    None
                }
            })
            .collect()
    }

    fn spawn_all(&self) -> Vec<(String, JoinHandle<LoopSummary>)> {
        self.config
            .targets
            .iter()
            .map(|target| {
                let target_loop = TargetLoop::new(
                    self.cluster.clone(),
                    target.clone(),
                    &self.config,
                    self.cancellation_token.clone(),
                );
                (target.to_string(), tokio::spawn(target_loop.run()))
            })
            .collect()
    }
}

/// Cancel `token` on SIGTERM or SIGINT.
pub fn spawn_signal_handler(token: CancellationToken) -> std::io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                }
            }
            token.cancel();
        }))
    }
    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {e}");
                return;
            }
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
            token.cancel();
        }))
    }
}
