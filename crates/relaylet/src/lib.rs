//! Virtual kubelet daemon that runs host pods in a remote cluster.
//!
//! The daemon registers a virtual node in the host cluster and drives a
//! [`Provider`](relaylet_provider::Provider) from three loops:
//!
//! - **Pod sync**: watches host pods bound to the virtual node and relays
//!   create and delete calls; writes remote pod status back to the host
//! - **Node heartbeat**: registers the `Node` object and refreshes its
//!   conditions on a fixed interval
//! - **Daemon endpoint**: a kubelet-style HTTP API for pod listing, logs and
//!   exec
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Host cluster API server                      │
//! └─────────────────────────────────────────────────────────────┘
//!        │ watch pods             ▲ node status      ▲ logs/exec
//!        ▼                        │                  │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         relaylet                             │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │  Pod sync   │ │  Node       │ │  Daemon endpoint    │   │
//! │  │             │ │  heartbeat  │ │  (axum)             │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! │                         │                                   │
//! │                         ▼                                   │
//! │                  RemoteProvider                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Remote cluster API server                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod error;
pub mod handlers;
pub mod heartbeat;
pub mod routes;
pub mod state;
pub mod sync;

pub use cli::Cli;
pub use error::ApiError;
pub use heartbeat::NodeHeartbeat;
pub use routes::create_router;
pub use state::DaemonState;
pub use sync::PodSync;
