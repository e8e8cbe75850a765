//! Types for the provider crate.

use serde::{Deserialize, Serialize};

/// Static facts about the virtual node, supplied at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Name of the virtual node in the host cluster.
    pub node_name: String,
    /// Operating system reported for the node.
    pub operating_system: String,
    /// Internal IP reported in the node addresses.
    pub internal_ip: String,
    /// Port of the kubelet-style daemon endpoint.
    pub daemon_port: i32,
}

impl Default for NodeInfo {
    fn default() -> Self {
        Self {
            node_name: "relaylet".to_string(),
            operating_system: "Linux".to_string(),
            internal_ip: "127.0.0.1".to_string(),
            daemon_port: 10250,
        }
    }
}

/// Options accepted by container log requests.
///
/// Mirrors the kubelet query parameters. The provider does not stream remote
/// logs, so these are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerLogOptions {
    /// Number of lines from the end of the log.
    pub tail_lines: Option<u32>,
    /// Maximum number of bytes to return.
    pub limit_bytes: Option<u64>,
    /// Prefix every line with its timestamp.
    pub timestamps: bool,
    /// Keep the stream open for new lines.
    pub follow: bool,
    /// Read the previous container instance's log.
    pub previous: bool,
    /// Only lines newer than this many seconds.
    pub since_seconds: Option<u64>,
}

/// A container log stream.
pub type ContainerLogs = Box<dyn futures::AsyncBufRead + Send + Unpin>;
