//! The `StrataClusterRestore` resource: restores a cluster from a
//! [`StrataClusterSnapshot`][crate::crd::snapshot::StrataClusterSnapshot].

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A restore of a single cluster from a snapshot.
#[derive(CustomResource, Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "stratadb.io",
    version = "v1",
    kind = "StrataClusterRestore",
    plural = "strataclusterrestores",
    shortname = "scr",
    status = "StrataClusterRestoreStatus",
    namespaced,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterRestoreSpec {
    /// The snapshot from which the restore is done.
    pub source: RestoreSource,

    /// The cluster where the source data ends up.
    pub destination: RestoreDestination,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSource {
    /// Name of the snapshot to restore from.
    pub snapshot_name: String,

    /// Namespace of the snapshot.
    pub namespace: String,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreDestination {
    /// Name of the destination cluster.
    pub name: String,

    /// Namespace of the destination cluster.
    pub namespace: String,

    /// Create a new cluster with the given name instead of restoring into an
    /// existing one.
    #[serde(default)]
    pub create: bool,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum RestorePhase {
    Running,
    Skipped,
    Failed,
    Succeeded,
    Pending,
}

/// The observed state of a [`StrataClusterRestore`]. Written exclusively by
/// the control loop.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterRestoreStatus {
    pub phase: Option<RestorePhase>,

    /// Message from the operator in case of failures, like a missing source
    /// snapshot.
    pub message: Option<String>,
}
