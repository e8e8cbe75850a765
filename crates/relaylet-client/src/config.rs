//! Provider configuration file.
//!
//! The file is YAML with two keys:
//!
//! ```yaml
//! LocalKubeConfig: /etc/relaylet/local.kubeconfig
//! RemoteKubeConfig: /etc/relaylet/remote.kubeconfig
//! ```
//!
//! Either key may be omitted or left empty, in which case the kubeconfig path
//! is resolved from the environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Parsed provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// Kubeconfig for the local (host) cluster.
    #[serde(rename = "LocalKubeConfig", default)]
    pub local_kubeconfig: Option<PathBuf>,

    /// Kubeconfig for the remote execution cluster.
    #[serde(rename = "RemoteKubeConfig", default)]
    pub remote_kubeconfig: Option<PathBuf>,
}

impl ProviderConfig {
    /// Load the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ClientError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml(&data)?;
        tracing::debug!(
            path = %path.display(),
            local = ?config.local_kubeconfig,
            remote = ?config.remote_kubeconfig,
            "Loaded provider config"
        );
        Ok(config)
    }

    /// Parse the configuration from a YAML string.
    ///
    /// Empty path values are normalized to `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml(data: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: Self = serde_yaml::from_str(data)?;
        config.local_kubeconfig = config.local_kubeconfig.filter(|p| !p.as_os_str().is_empty());
        config.remote_kubeconfig = config
            .remote_kubeconfig
            .filter(|p| !p.as_os_str().is_empty());
        Ok(config)
    }
}
