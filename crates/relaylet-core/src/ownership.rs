//! Ownership marker for pods relaylet manages in the remote cluster.
//!
//! The marker is written both as an annotation and as a label. The label is
//! what the remote API server can filter on; the annotation is the marker
//! proper and is re-checked after listing.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;

/// Key of the ownership marker.
pub const OWNER_MARKER_KEY: &str = "virtual-kube-type";

/// Value of the ownership marker.
pub const OWNER_MARKER_VALUE: &str = "relaylet";

/// Label selector matching every pod carrying the ownership marker.
#[must_use]
pub fn owner_selector() -> String {
    format!("{OWNER_MARKER_KEY}={OWNER_MARKER_VALUE}")
}

/// A fresh map holding only the marker entry.
#[must_use]
pub fn owner_marker() -> BTreeMap<String, String> {
    BTreeMap::from([(OWNER_MARKER_KEY.to_string(), OWNER_MARKER_VALUE.to_string())])
}

/// Check whether a pod carries the ownership marker annotation.
#[must_use]
pub fn is_owned(pod: &Pod) -> bool {
    pod.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(OWNER_MARKER_KEY))
        .is_some_and(|v| v == OWNER_MARKER_VALUE)
}
