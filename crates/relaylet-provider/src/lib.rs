//! Virtual node provider that relays pod lifecycle calls to a remote cluster.
//!
//! This crate provides the [`Provider`] trait, the contract a host cluster's
//! virtual node calls into, and [`RemoteProvider`], which implements it by
//! relaying every call to a second Kubernetes cluster. It handles:
//!
//! - Whitelist translation of host pods into remote pods
//! - Create idempotency by existence check
//! - Mapping of remote absence onto `NotFound` / `Unknown` results
//! - Static node capacity, conditions and addresses for the virtual node
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Host cluster (virtual node)                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      RemoteProvider                              │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────────┐   │
//! │  │  Pod        │ │  Lifecycle  │ │    Node status          │   │
//! │  │  translator │ │  relay      │ │    synthesizer          │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────────┘   │
//! │                         │                                       │
//! │                         ▼                                       │
//! │                   ┌───────────┐                                 │
//! │                   │  PodApi   │                                 │
//! │                   └───────────┘                                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Remote cluster API server                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use relaylet_provider::{KubePodApi, NodeInfo, Provider, RemoteProvider};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(remote: kube::Client) -> Result<(), Box<dyn std::error::Error>> {
//! let provider = RemoteProvider::new(KubePodApi::new(remote), NodeInfo::default());
//! let cancel = CancellationToken::new();
//!
//! for pod in provider.get_pods(&cancel).await? {
//!     println!("{:?}", pod.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! Enable the `test-utils` feature to get [`MockPodApi`], an in-memory remote
//! cluster that answers with real `kube::Error` responses:
//!
//! ```ignore
//! use relaylet_provider::{MockPodApi, NodeInfo, RemoteProvider};
//!
//! let provider = RemoteProvider::new(MockPodApi::new(), NodeInfo::default());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cancel;
pub mod error;
pub mod node;
pub mod provider;
pub mod remote;
pub mod translate;
pub mod types;

pub use error::{ProviderError, Result};
pub use provider::{Provider, RemoteProvider};
pub use remote::{KubePodApi, PodApi};
pub use types::{ContainerLogOptions, ContainerLogs, NodeInfo};

#[cfg(any(test, feature = "test-utils"))]
pub use remote::mock::MockPodApi;
