//! The `StrataCloudRegion` resource: a Kubernetes cluster participating in
//! the managed cloud, together with the platform components installed into
//! it and the inventory the control loop reports back.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A region of the managed cloud.
#[derive(CustomResource, Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "stratadb.io",
    version = "v1",
    kind = "StrataCloudRegion",
    plural = "stratacloudregions",
    shortname = "region",
    status = "StrataCloudRegionStatus",
    printcolumn = r#"{"name":"K8s Version","type":"string","jsonPath":".status.k8sVersion"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StrataCloudRegionSpec {
    /// The unique identifier of the region.
    #[serde(default)]
    pub id: String,

    /// The platform components to be installed in the region.
    #[serde(default)]
    pub components: Vec<ComponentReference>,
}

/// Reference to a platform component installed in a region.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReference {
    /// Group and version of the component being referenced.
    pub api_version: String,

    /// Kind of the component being referenced.
    pub kind: String,

    /// Name of the component being referenced.
    pub name: String,

    /// Namespace of the component being referenced.
    pub namespace: String,

    /// Whether the component is marked for deletion.
    #[serde(default)]
    pub marked_for_deletion: bool,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum RegionPhase {
    Ready,
    NotReady,
    FailedToSync,
}

/// Where node and container metrics of a region are scraped from.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MetricSource {
    Kubelet,
    Api,
}

/// The observed state of a [`StrataCloudRegion`]. Written exclusively by the
/// control loop.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrataCloudRegionStatus {
    /// The current phase of the region.
    pub phase: Option<RegionPhase>,

    /// The version of the Kubernetes cluster.
    #[serde(default, rename = "k8sVersion")]
    pub kubernetes_version: String,

    /// The number of nodes in the Kubernetes cluster.
    #[serde(default)]
    pub number_of_nodes: u32,

    /// The capabilities of the Kubernetes cluster.
    pub capabilities: Option<RegionCapabilities>,

    /// The status of the installed platform components.
    #[serde(default)]
    pub components: Vec<ComponentStatus>,

    /// Info explaining the current phase of the region.
    #[serde(default)]
    pub message: String,

    /// The distribution of the Kubernetes cluster.
    pub kubernetes_distribution: Option<KubernetesDistribution>,

    /// Monitoring sources of the region.
    pub monitoring: Option<Monitoring>,

    /// The storage classes available in the Kubernetes cluster.
    #[serde(default)]
    pub storage_classes: Vec<StorageClass>,

    /// The volume snapshot classes available in the Kubernetes cluster.
    #[serde(default)]
    pub volume_snapshot_classes: Vec<VolumeSnapshotClass>,

    /// Information about the nodes in the Kubernetes cluster.
    #[serde(default)]
    pub node_infos: Vec<NodeInfo>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCapabilities {
    /// Whether the Kubernetes cluster supports volume snapshots.
    pub volume_snapshot: Option<bool>,

    /// Whether the Kubernetes cluster supports volume expansion.
    pub volume_expansion: Option<bool>,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KubernetesDistribution {
    Unknown,
    Aws,
    Gcp,
    Azure,
    Do,
    Scaleway,
    Openshift,
    Linode,
    Civo,
    Oci,
    Ovhcloud,
    Stackit,
    Vultr,
    K3s,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitoring {
    /// Source of the cAdvisor (container) metrics.
    pub c_advisor_metric_source: Option<MetricSource>,

    /// Source of the node metrics.
    pub node_metric_source: Option<MetricSource>,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum ComponentPhase {
    Ready,
    NotReady,
    Unknown,
    NotFound,
}

/// The status of a single platform component in a region.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// Name of the component.
    pub name: String,

    /// Namespace of the component.
    #[serde(default)]
    pub namespace: String,

    /// Installed version of the component.
    #[serde(default)]
    pub version: String,

    /// The current phase of the component.
    pub phase: Option<ComponentPhase>,

    /// Info explaining the current phase of the component.
    #[serde(default)]
    pub message: String,
}

/// A storage class available in a region.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClass {
    /// Name of the storage class.
    pub name: String,

    /// Whether this is the default storage class.
    #[serde(default)]
    pub default: bool,

    /// Provisioner of the storage class.
    #[serde(default)]
    pub provisioner: String,

    /// Whether the storage class allows volume expansion.
    #[serde(default)]
    pub allow_volume_expansion: bool,

    /// Reclaim policy of the storage class.
    #[serde(default)]
    pub reclaim_policy: String,

    /// Parameters of the storage class.
    #[serde(default)]
    pub parameters: std::collections::BTreeMap<String, String>,
}

/// A volume snapshot class available in a region.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotClass {
    /// Name of the volume snapshot class.
    pub name: String,

    /// Driver of the volume snapshot class.
    #[serde(default)]
    pub driver: String,
}

/// Information about a single Kubernetes node in a region.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// Name of the node.
    pub name: String,

    /// Region label of the node.
    #[serde(default)]
    pub region: String,

    /// Zone label of the node.
    #[serde(default)]
    pub zone: String,

    /// Instance type of the node.
    #[serde(default)]
    pub instance_type: String,

    /// CPU architecture of the node.
    #[serde(default)]
    pub arch: String,

    /// Capacity of the node.
    pub capacity: NodeResourceInfo,

    /// Allocatable resources of the node.
    pub allocatable: NodeResourceInfo,
}

/// Resource amounts of a single Kubernetes node.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResourceInfo {
    /// CPU resources of the node.
    #[serde(default)]
    pub cpu: String,

    /// Memory resources of the node.
    #[serde(default)]
    pub memory: String,

    /// Pod capacity of the node.
    #[serde(default)]
    pub pods: String,

    /// Ephemeral storage of the node.
    #[serde(default)]
    pub ephemeral_storage: String,
}
