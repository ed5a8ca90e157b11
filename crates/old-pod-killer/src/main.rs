use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use old_pod_killer::config::Cli;
use old_pod_killer::config::GlobalConfig;
use old_pod_killer::coordinator::spawn_signal_handler;
use old_pod_killer::coordinator::Coordinator;
use old_pod_killer::k8s::init_kube_client;
use old_pod_killer::k8s::ClusterApi;
use old_pod_killer::k8s::KubeCluster;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    utils::logging::init();

    tracing::info!("Starting old-pod-killer {}", &**version::VERSION);

    let config_path = cli.config_path();
    let config = GlobalConfig::load(&config_path)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e:?}"))?;
    tracing::info!(
        targets = config.targets.len(),
        dry_run = config.dry_run,
        batch_mode = config.batch_mode,
        "Configuration loaded from {}",
        config_path.display()
    );

    let client = init_kube_client(cli.kubeconfig())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize Kubernetes client: {e:?}"))?;
    let cluster: Arc<dyn ClusterApi> = Arc::new(KubeCluster::new(client));

    let coordinator = Coordinator::new(cluster, Arc::new(config));
    let signal_handler = spawn_signal_handler(coordinator.cancellation_token())?;

    let summaries = coordinator.run().await;
    signal_handler.abort();

    let evicted: u64 = summaries.iter().map(|summary| summary.evicted).sum();
    tracing::info!(
        "All {} target loop(s) stopped, {evicted} pod(s) evicted in total",
        summaries.len()
    );

    Ok(())
}
