//! Provider configuration and cluster client bootstrap for relaylet.
//!
//! relaylet talks to two clusters:
//!
//! - the **local** (host) cluster, where the virtual node is registered and
//!   where pods are scheduled onto it
//! - the **remote** cluster, where those pods actually run
//!
//! This crate turns a provider config file into two authenticated
//! [`kube::Client`] handles. Both are created once at startup and shared by
//! every caller; `kube::Client` is cheap to clone and safe for concurrent use.
//!
//! # Example
//!
//! ```no_run
//! use relaylet_client::{ClusterClients, ProviderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::load("/etc/relaylet/provider.yaml")?;
//! let clients = ClusterClients::from_config(&config).await?;
//!
//! let _remote = clients.remote.clone();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clients;
pub mod config;
pub mod error;
pub mod kubeconfig;

pub use clients::ClusterClients;
pub use config::ProviderConfig;
pub use error::{ClientError, Result};
pub use kubeconfig::{connect, KubeconfigSource, KUBE_CONFIG_PATH_ENV};
