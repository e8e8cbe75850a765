//! Core types and utilities for relaylet.
//!
//! This crate provides the foundational types shared by the provider and the
//! daemon:
//!
//! - **Identity**: [`PodRef`], the `namespace/name` pair that keys every pod
//!   operation on both clusters
//! - **Ownership**: the marker attached to every pod relaylet creates in the
//!   remote cluster
//! - **Error types**: common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use relaylet_core::{PodRef, OWNER_MARKER_KEY, OWNER_MARKER_VALUE};
//!
//! let pod_ref: PodRef = "default/web".parse().unwrap();
//! assert_eq!(pod_ref.namespace(), "default");
//! assert_eq!(pod_ref.name(), "web");
//!
//! let selector = relaylet_core::ownership::owner_selector();
//! assert_eq!(selector, format!("{OWNER_MARKER_KEY}={OWNER_MARKER_VALUE}"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ownership;
pub mod pod_ref;

pub use error::{CoreError, Result};
pub use ownership::{OWNER_MARKER_KEY, OWNER_MARKER_VALUE};
pub use pod_ref::PodRef;
