use std::path::PathBuf;

use error_stack::Report;
use error_stack::ResultExt;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Client;
use kube::Config;
use tracing::info;
use tracing::warn;

use crate::k8s::KubernetesError;

/// Endpoint served by `kubectl proxy`, used when no in-cluster config exists.
pub const KUBECTL_PROXY_URL: &str = "http://127.0.0.1:8001";

/// Build the cluster client shared by every target loop.
///
/// An explicit kubeconfig wins. Otherwise the in-cluster service account is
/// used, falling back to a local `kubectl proxy` rather than failing.
///
/// # Errors
///
/// - [`KubernetesError::ConnectionFailed`] if the kubeconfig cannot be loaded
///   or the client cannot be constructed
pub async fn init_kube_client(
    kubeconfig: Option<PathBuf>,
) -> Result<Client, Report<KubernetesError>> {
    let config = match kubeconfig {
        Some(kubeconfig_path) => {
            // Load kubeconfig from the specified file
            let kubeconfig = Kubeconfig::read_from(&kubeconfig_path).change_context(
                KubernetesError::ConnectionFailed {
                    message: format!(
                        "Failed to read kubeconfig file: {}",
                        kubeconfig_path.display()
                    ),
                },
            )?;

            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .change_context(KubernetesError::ConnectionFailed {
                    message: format!(
                        "Failed to create config from kubeconfig: {}",
                        kubeconfig_path.display()
                    ),
                })?
        }
        None => match Config::incluster() {
            Ok(config) => config,
            Err(e) => {
                warn!("Get in cluster config error: {e}");
                info!("Will try connect to {KUBECTL_PROXY_URL} (kubectl proxy)");
                kubectl_proxy_config()?
            }
        },
    };

    Client::try_from(config).change_context(KubernetesError::ConnectionFailed {
        message: "Failed to create Kubernetes client".to_string(),
    })
}

fn kubectl_proxy_config() -> Result<Config, Report<KubernetesError>> {
    match KUBECTL_PROXY_URL.parse() {
        Ok(cluster_url) => Ok(Config::new(cluster_url)),
        Err(e) => Err(Report::new(KubernetesError::ConnectionFailed {
            message: format!("Invalid kubectl proxy url {KUBECTL_PROXY_URL}: {e}"),
        })),
    }
}
