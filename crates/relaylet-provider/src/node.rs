//! Node status synthesis for the virtual node.
//!
//! Everything reported here is static: capacity is a fixed ceiling rather
//! than a measurement of the remote cluster, and every condition reports
//! healthy. Only the timestamps change between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{
    DaemonEndpoint, Node, NodeAddress, NodeCondition, NodeDaemonEndpoints, NodeSpec, NodeStatus,
    NodeSystemInfo, Taint,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::ObjectMeta;

use relaylet_core::OWNER_MARKER_VALUE;

use crate::provider::Provider;
use crate::types::NodeInfo;

/// Advertised CPU, in cores.
pub const CAPACITY_CPU: &str = "100";
/// Advertised memory.
pub const CAPACITY_MEMORY: &str = "50Gi";
/// Advertised pod slots.
pub const CAPACITY_PODS: &str = "100";

const CONDITION_REASON: &str = "remote cluster is ready";
const CONDITION_MESSAGE: &str = "ok";

/// Taint key keeping ordinary workloads off the virtual node.
pub const PROVIDER_TAINT_KEY: &str = "virtual-kubelet.io/provider";

/// The fixed capacity of the virtual node.
#[must_use]
pub fn capacity() -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(CAPACITY_CPU.to_string())),
        ("memory".to_string(), Quantity(CAPACITY_MEMORY.to_string())),
        ("pods".to_string(), Quantity(CAPACITY_PODS.to_string())),
    ])
}

/// The node conditions, all healthy, stamped with `now`.
#[must_use]
pub fn conditions(now: DateTime<Utc>) -> Vec<NodeCondition> {
    [
        ("Ready", "True"),
        ("OutOfDisk", "False"),
        ("MemoryPressure", "False"),
        ("DiskPressure", "False"),
        ("NetworkUnavailable", "False"),
        ("KubeletConfigOk", "True"),
    ]
    .into_iter()
    .map(|(type_, status)| NodeCondition {
        type_: type_.to_string(),
        status: status.to_string(),
        last_heartbeat_time: Some(Time(now)),
        last_transition_time: Some(Time(now)),
        reason: Some(CONDITION_REASON.to_string()),
        message: Some(CONDITION_MESSAGE.to_string()),
    })
    .collect()
}

/// The node addresses: the configured internal IP.
#[must_use]
pub fn addresses(info: &NodeInfo) -> Vec<NodeAddress> {
    vec![NodeAddress {
        type_: "InternalIP".to_string(),
        address: info.internal_ip.clone(),
    }]
}

/// The daemon endpoints: the configured kubelet port.
#[must_use]
pub fn daemon_endpoints(info: &NodeInfo) -> NodeDaemonEndpoints {
    NodeDaemonEndpoints {
        kubelet_endpoint: Some(DaemonEndpoint {
            port: info.daemon_port,
        }),
    }
}

/// Build the `Node` object registered in the host cluster.
///
/// The node is tainted so only pods that tolerate the provider are scheduled
/// onto it.
#[must_use]
pub fn build_node<P>(provider: &P, node_name: &str) -> Node
where
    P: Provider + ?Sized,
{
    let operating_system = provider.operating_system().to_string();

    let labels = BTreeMap::from([
        ("type".to_string(), "virtual-kubelet".to_string()),
        ("kubernetes.io/role".to_string(), "agent".to_string()),
        ("kubernetes.io/hostname".to_string(), node_name.to_string()),
        ("kubernetes.io/os".to_string(), operating_system.to_lowercase()),
    ]);

    Node {
        metadata: ObjectMeta {
            name: Some(node_name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(NodeSpec {
            taints: Some(vec![Taint {
                key: PROVIDER_TAINT_KEY.to_string(),
                value: Some(OWNER_MARKER_VALUE.to_string()),
                effect: "NoSchedule".to_string(),
                time_added: None,
            }]),
            ..Default::default()
        }),
        status: Some(build_node_status(provider)),
    }
}

/// Build the status block of the virtual node.
#[must_use]
pub fn build_node_status<P>(provider: &P) -> NodeStatus
where
    P: Provider + ?Sized,
{
    let capacity = provider.capacity();

    NodeStatus {
        allocatable: Some(capacity.clone()),
        capacity: Some(capacity),
        conditions: Some(provider.node_conditions()),
        addresses: Some(provider.node_addresses()),
        daemon_endpoints: Some(provider.node_daemon_endpoints()),
        node_info: Some(NodeSystemInfo {
            operating_system: provider.operating_system().to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}
