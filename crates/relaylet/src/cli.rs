//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use relaylet_provider::NodeInfo;

/// Virtual kubelet that runs host pods in a remote cluster.
#[derive(Debug, Clone, Parser)]
#[command(name = "relaylet", version, about)]
pub struct Cli {
    /// Provider config file naming the local and remote kubeconfigs.
    #[arg(long, env = "PROVIDER_CONFIG")]
    pub provider_config: PathBuf,

    /// Name of the virtual node in the host cluster.
    #[arg(long = "nodename", env = "VKUBELET_NODE_NAME", default_value = "relaylet")]
    pub node_name: String,

    /// Operating system reported for the node.
    #[arg(long = "os", default_value = "Linux")]
    pub operating_system: String,

    /// Internal IP reported for the node.
    #[arg(long, env = "VKUBELET_POD_IP", default_value = "127.0.0.1")]
    pub internal_ip: String,

    /// Port of the kubelet daemon endpoint.
    #[arg(long, env = "KUBELET_PORT", default_value_t = 10250)]
    pub daemon_port: u16,

    /// Listen address of the daemon endpoint (defaults to all interfaces on
    /// the daemon port).
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Seconds between node status updates.
    #[arg(long, default_value_t = 10)]
    pub node_status_interval: u64,

    /// Seconds between pod status syncs.
    #[arg(long, default_value_t = 5)]
    pub pod_status_interval: u64,

    /// Use the in-cluster service account for the local cluster.
    #[arg(long)]
    pub local_in_cluster: bool,
}

impl Cli {
    /// Node facts handed to the provider.
    #[must_use]
    pub fn node_info(&self) -> NodeInfo {
        NodeInfo {
            node_name: self.node_name.clone(),
            operating_system: self.operating_system.clone(),
            internal_ip: self.internal_ip.clone(),
            daemon_port: i32::from(self.daemon_port),
        }
    }

    /// The address the daemon endpoint binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        self.listen_addr
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.daemon_port))
    }

    /// Interval between node status updates.
    #[must_use]
    pub fn node_status_interval(&self) -> Duration {
        Duration::from_secs(self.node_status_interval.max(1))
    }

    /// Interval between pod status syncs.
    #[must_use]
    pub fn pod_status_interval(&self) -> Duration {
        Duration::from_secs(self.pod_status_interval.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from([
            "relaylet",
            "--provider-config",
            "/etc/relaylet/provider.yaml",
            "--nodename",
            "edge",
            "--internal-ip",
            "10.0.0.9",
            "--daemon-port",
            "10250",
        ])
        .unwrap();

        let info = cli.node_info();
        assert_eq!(info.node_name, "edge");
        assert_eq!(info.operating_system, "Linux");
        assert_eq!(info.internal_ip, "10.0.0.9");
        assert_eq!(info.daemon_port, 10250);
        assert!(!cli.local_in_cluster);
    }

    #[test]
    fn listen_addr_follows_daemon_port() {
        let cli = Cli::try_parse_from([
            "relaylet",
            "--provider-config",
            "p.yaml",
            "--daemon-port",
            "10255",
            "--listen-addr",
            "127.0.0.1:9000",
        ])
        .unwrap();
        assert_eq!(cli.listen_addr(), "127.0.0.1:9000");

        let cli = Cli {
            listen_addr: None,
            ..cli
        };
        assert_eq!(cli.listen_addr(), "0.0.0.0:10255");
    }

    #[test]
    fn intervals_are_at_least_one_second() {
        let cli = Cli::try_parse_from([
            "relaylet",
            "--provider-config",
            "p.yaml",
            "--node-status-interval",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.node_status_interval(), Duration::from_secs(1));
        assert_eq!(cli.pod_status_interval(), Duration::from_secs(5));
    }
}
