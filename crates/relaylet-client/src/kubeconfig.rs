//! Kubeconfig resolution and client construction.

use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Environment variable consulted when no kubeconfig path is configured.
pub const KUBE_CONFIG_PATH_ENV: &str = "KUBE_CONFIG_PATH";

/// Where a cluster client takes its credentials from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeconfigSource {
    /// The service account mounted into the running pod.
    InCluster,
    /// A kubeconfig file on disk.
    File(PathBuf),
}

impl KubeconfigSource {
    /// Resolve an out-of-cluster kubeconfig path.
    ///
    /// An explicit, non-empty path wins; otherwise [`KUBE_CONFIG_PATH_ENV`] is
    /// consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingKubeconfig`] if neither is set.
    pub fn resolve(explicit: Option<&Path>, cluster: &'static str) -> Result<Self> {
        Self::resolve_with(explicit, std::env::var(KUBE_CONFIG_PATH_ENV).ok(), cluster)
    }

    fn resolve_with(
        explicit: Option<&Path>,
        fallback: Option<String>,
        cluster: &'static str,
    ) -> Result<Self> {
        if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(Self::File(path.to_path_buf()));
        }

        match fallback.filter(|v| !v.is_empty()) {
            Some(path) => {
                debug!(cluster, path, "Using kubeconfig from {KUBE_CONFIG_PATH_ENV}");
                Ok(Self::File(PathBuf::from(path)))
            }
            None => Err(ClientError::MissingKubeconfig {
                cluster,
                env: KUBE_CONFIG_PATH_ENV,
            }),
        }
    }
}

/// Build an authenticated client for a cluster.
///
/// # Errors
///
/// Returns an error if the kubeconfig cannot be loaded or the client cannot
/// be constructed.
pub async fn connect(source: &KubeconfigSource) -> Result<Client> {
    let config = match source {
        KubeconfigSource::InCluster => Config::incluster()?,
        KubeconfigSource::File(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|source| {
                ClientError::Kubeconfig {
                    path: path.clone(),
                    source,
                }
            })?;

            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|source| ClientError::Kubeconfig {
                    path: path.clone(),
                    source,
                })?
        }
    };

    info!(cluster_url = %config.cluster_url, "Creating Kubernetes client");
    Ok(Client::try_from(config)?)
}
