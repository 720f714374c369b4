//! The `StrataClusterScheduledSnapshot` resource: a cron schedule producing
//! [`StrataClusterSnapshot`][crate::crd::snapshot::StrataClusterSnapshot]s.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A snapshot schedule for a single cluster.
#[derive(CustomResource, Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "stratadb.io",
    version = "v1",
    kind = "StrataClusterScheduledSnapshot",
    plural = "strataclusterscheduledsnapshots",
    shortname = "scssnap",
    status = "StrataClusterScheduledSnapshotStatus",
    namespaced,
    printcolumn = r#"{"name":"Cluster","type":"string","jsonPath":".spec.cluster-id"}"#,
    printcolumn = r#"{"name":"Schedule","type":"string","jsonPath":".spec.schedule"}"#,
    printcolumn = r#"{"name":"Scheduled","type":"string","jsonPath":".status.scheduled"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterScheduledSnapshotSpec {
    /// The cluster to snapshot.
    #[serde(rename = "cluster-id")]
    pub cluster_id: String,

    /// Short id identifying this schedule, at most 8 characters. Snapshots
    /// produced by the schedule reference it.
    pub schedule_short_id: String,

    /// Cron expression for the snapshot frequency, specified in UTC.
    pub schedule: String,

    /// Retention of the produced snapshots in hours, e.g. `"72h"`.
    pub retention: String,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum ScheduledSnapshotPhase {
    Active,
    Disabled,
}

/// The observed state of a [`StrataClusterScheduledSnapshot`]. Written
/// exclusively by the control loop.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterScheduledSnapshotStatus {
    pub phase: Option<ScheduledSnapshotPhase>,

    /// The next scheduled snapshot time in UTC.
    pub scheduled: Option<Time>,

    /// Message from the operator in case of failures, like an invalid
    /// schedule expression.
    pub message: Option<String>,
}
