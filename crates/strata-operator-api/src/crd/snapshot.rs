//! The `StrataClusterSnapshot` resource: a point-in-time backup of a
//! cluster, taken as volume snapshots of all database nodes.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A snapshot of a single cluster.
#[derive(CustomResource, Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "stratadb.io",
    version = "v1",
    kind = "StrataClusterSnapshot",
    plural = "strataclustersnapshots",
    shortname = "scsnap",
    status = "StrataClusterSnapshotStatus",
    namespaced,
    printcolumn = r#"{"name":"Cluster","type":"string","jsonPath":".spec.cluster-id"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"RetainUntil","type":"string","jsonPath":".status.retainUntil"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterSnapshotSpec {
    /// The cluster to snapshot. The cluster must live in the same namespace
    /// as this resource.
    #[serde(rename = "cluster-id")]
    pub cluster_id: String,

    /// The creation timestamp of the backup, in Unix epoch format.
    pub creation_timestamp: Option<i64>,

    /// The short id of the schedule that produced this snapshot, at most 8
    /// characters. Unset for manually taken snapshots.
    pub schedule_short_id: Option<String>,

    /// The retention period of this snapshot in hours, e.g. `"72h"`. If
    /// unset, the snapshot is never removed.
    pub retention: Option<String>,
}

impl StrataClusterSnapshotSpec {
    /// The retention period in hours, if one is set and well-formed.
    pub fn retention_hours(&self) -> Option<u64> {
        self.retention
            .as_deref()
            .and_then(|retention| retention.strip_suffix('h'))
            .and_then(|hours| hours.parse().ok())
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum SnapshotPhase {
    Running,
    Skipped,
    Failed,
    Succeeded,
}

/// The observed state of a [`StrataClusterSnapshot`]. Written exclusively by
/// the control loop.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterSnapshotStatus {
    pub phase: Option<SnapshotPhase>,

    /// The volume snapshots that were created, one per database node.
    #[serde(default)]
    pub volume_snapshots: Vec<VolumeSnapshotInfo>,

    /// When this snapshot will be deleted, if a retention is set.
    pub retain_until: Option<Time>,

    /// How long the snapshot took to complete, in `"DDdHHhMMmSSs"` format,
    /// e.g. `"1d3h5m10s"` or `"10s"`.
    pub completion_time: Option<String>,
}

/// A single volume snapshot backing a cluster snapshot.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotInfo {
    /// Name of the volume snapshot object.
    pub volume_snapshot_name: String,

    /// Name of the volume that was backed up.
    pub volume_name: String,

    /// Whether the volume snapshot is ready to use.
    #[serde(default)]
    pub ready_to_use: bool,

    /// Identifier of the volume snapshot at the cloud provider.
    pub snapshot_handle: Option<String>,
}

impl StrataClusterSnapshot {
    /// Whether the snapshot reached a terminal phase.
    pub fn is_completed(&self) -> bool {
        self.status.as_ref().is_some_and(|status| {
            matches!(
                status.phase,
                Some(SnapshotPhase::Succeeded | SnapshotPhase::Failed | SnapshotPhase::Skipped)
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn snapshot(phase: Option<SnapshotPhase>) -> StrataClusterSnapshot {
        let mut snapshot = StrataClusterSnapshot::new(
            "snap",
            StrataClusterSnapshotSpec {
                cluster_id: "test-cluster".to_owned(),
                creation_timestamp: None,
                schedule_short_id: None,
                retention: None,
            },
        );
        snapshot.status = Some(StrataClusterSnapshotStatus {
            phase,
            ..StrataClusterSnapshotStatus::default()
        });

        snapshot
    }

    #[rstest]
    #[case::unset(None, false)]
    #[case::running(Some(SnapshotPhase::Running), false)]
    #[case::succeeded(Some(SnapshotPhase::Succeeded), true)]
    #[case::failed(Some(SnapshotPhase::Failed), true)]
    #[case::skipped(Some(SnapshotPhase::Skipped), true)]
    fn completion(#[case] phase: Option<SnapshotPhase>, #[case] expected: bool) {
        assert_eq!(snapshot(phase).is_completed(), expected);
    }

    #[rstest]
    #[case::unset(None, None)]
    #[case::well_formed(Some("72h"), Some(72))]
    #[case::malformed(Some("3d"), None)]
    fn retention_parsing(#[case] retention: Option<&str>, #[case] expected: Option<u64>) {
        let spec = StrataClusterSnapshotSpec {
            cluster_id: "test-cluster".to_owned(),
            creation_timestamp: None,
            schedule_short_id: None,
            retention: retention.map(str::to_owned),
        };

        assert_eq!(spec.retention_hours(), expected);
    }
}
