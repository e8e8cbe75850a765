//! The pair of cluster clients relaylet runs with.

use kube::Client;
use tracing::info;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::kubeconfig::{connect, KubeconfigSource};

/// Authenticated handles to the local and remote clusters.
///
/// Built once before any provider call and never renewed. Callers hold
/// clones; `kube::Client` is safe to use from many tasks at once.
#[derive(Clone)]
pub struct ClusterClients {
    /// Client for the host cluster the virtual node registers into.
    pub local: Client,
    /// Client for the cluster that runs the pods.
    pub remote: Client,
}

impl ClusterClients {
    /// Build both clients from a provider config.
    ///
    /// # Errors
    ///
    /// Returns an error if either kubeconfig is missing or invalid.
    pub async fn from_config(config: &ProviderConfig) -> Result<Self> {
        let local = KubeconfigSource::resolve(config.local_kubeconfig.as_deref(), "local")?;
        let remote = KubeconfigSource::resolve(config.remote_kubeconfig.as_deref(), "remote")?;
        Self::from_sources(&local, &remote).await
    }

    /// Build both clients from explicit credential sources.
    ///
    /// # Errors
    ///
    /// Returns an error if either client cannot be constructed.
    pub async fn from_sources(local: &KubeconfigSource, remote: &KubeconfigSource) -> Result<Self> {
        let local_client = connect(local).await?;
        let remote_client = connect(remote).await?;

        info!(local = ?local, remote = ?remote, "Cluster clients ready");

        Ok(Self {
            local: local_client,
            remote: remote_client,
        })
    }
}
