//! Error types for client bootstrap.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration or building clients.
///
/// All of these are configuration errors: the daemon does not start without
/// two working clients.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The provider config file could not be read.
    #[error("failed to read provider config {path}: {source}")]
    ReadConfig {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The provider config file is not valid YAML for [`crate::ProviderConfig`].
    #[error("failed to parse provider config: {0}")]
    ParseConfig(#[from] serde_yaml::Error),

    /// No kubeconfig path was configured and the fallback variable is unset.
    #[error("no kubeconfig path configured for the {cluster} cluster and {env} is not set")]
    MissingKubeconfig {
        /// Which cluster the path was needed for.
        cluster: &'static str,
        /// Name of the fallback environment variable.
        env: &'static str,
    },

    /// The kubeconfig file could not be loaded.
    #[error("invalid kubeconfig {path}: {source}")]
    Kubeconfig {
        /// Path of the kubeconfig.
        path: PathBuf,
        /// Underlying kubeconfig error.
        #[source]
        source: kube::config::KubeconfigError,
    },

    /// In-cluster configuration is unavailable.
    #[error("in-cluster config unavailable: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    /// The Kubernetes client could not be constructed.
    #[error("failed to create Kubernetes client: {0}")]
    Kube(#[from] kube::Error),
}

/// A specialized Result type for client bootstrap.
pub type Result<T> = std::result::Result<T, ClientError>;
