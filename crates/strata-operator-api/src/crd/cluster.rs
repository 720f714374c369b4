//! The `StrataCluster` resource: a managed StrataDB database cluster.
//!
//! The spec carries both restart-sensitive settings (node count, image,
//! database configuration) and settings that never require touching running
//! pods (ingress, child-object annotations, pause requests). Which of them
//! participate in restart decisions is defined by
//! [`RestartProjection`][crate::restart::RestartProjection], not here.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        core::v1::{EnvVar, SecretKeySelector, Toleration, TopologySpreadConstraint},
        policy::v1::PodDisruptionBudgetSpec,
    },
    apimachinery::pkg::apis::meta::v1::Condition,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use strata_shared::Fingerprint;

use crate::{
    lifecycle::ClusterPhase,
    operation::OperationLog,
    quantity::{ParseQuantityError, Quantity},
};

/// Annotation key to trigger a restart of all database pods.
///
/// The annotation is placed on the `StrataCluster` instance. The value should
/// be an RFC 3339 formatted date; updating the value re-triggers the restart.
/// For historical reasons the key does not carry the `operator.stratadb.io/`
/// prefix.
pub const RESTARTED_AT_ANNOTATION: &str = "restartedAt";

/// Annotation key to recreate a single node.
///
/// The annotation is placed on the pod of the node that needs to be
/// recreated; placing it on multiple pods is allowed. The value is free-form
/// and shows up in the emitted events. Requires the cluster manager.
pub const RECREATE_NODE_ANNOTATION: &str = "operator.stratadb.io/recreate-node";

/// Annotation key to trigger reinitialization of the cluster. The value is
/// ignored and can be used to document why reinitialization was requested.
pub const REINIT_ANNOTATION: &str = "operator.stratadb.io/reinit";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid quantity at {path}"))]
    InvalidQuantity {
        path: String,
        source: ParseQuantityError,
    },
}

/// A managed StrataDB cluster.
#[derive(CustomResource, Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "stratadb.io",
    version = "v1",
    kind = "StrataCluster",
    plural = "strataclusters",
    shortname = "sc",
    status = "StrataClusterStatus",
    namespaced,
    printcolumn = r#"{"name":"Nodes","type":"integer","jsonPath":".spec.size"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterSpec {
    /// The unique identifier of the cluster.
    pub id: String,

    /// The StrataDB version to deploy.
    pub version: String,

    /// The desired number of database nodes, between 1 and 100.
    #[schemars(range(min = 1, max = 100))]
    pub size: u16,

    /// Whether to start a dedicated Service for each node. Defaults to true.
    pub service_per_node: Option<bool>,

    /// Whether the shared cluster manager handles this cluster. If unset, the
    /// default is taken from the operator config.
    pub cluster_manager: Option<bool>,

    /// Suspend the cluster. All resources except the PVCs are removed while
    /// suspended.
    #[serde(default)]
    pub suspend: bool,

    /// Pause requests placed by developers for manual maintenance. The
    /// operator skips handling any changes while at least one request is
    /// present.
    #[serde(default)]
    pub pauses: Vec<Pause>,

    /// The container image to use for each database node.
    pub image: Option<ClusterImage>,

    /// The resources to allocate for each database node.
    #[serde(default)]
    pub resources: Resources,

    /// The security context the database process runs as.
    pub security: Option<SecurityContext>,

    /// Tolerations applied to each database pod.
    #[serde(default)]
    pub tolerations: Vec<Toleration>,

    /// Node selector applied to each database pod.
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,

    /// Database configuration distributed to all nodes.
    pub config: Option<ClusterConfiguration>,

    /// Ingress exposure of the cluster.
    pub ingress: Option<Ingress>,

    /// Configuration of the cluster's Kubernetes Service.
    pub service: Option<KubernetesService>,

    /// GPU configuration. If unset, no GPU is used.
    pub gpu: Option<Gpu>,

    /// Configuration of the cluster's Kubernetes StatefulSet.
    pub stateful_set: Option<KubernetesStatefulSet>,

    /// Storage class names for the db and snapshot volumes.
    pub storage_class_names: Option<StorageClassNames>,

    /// Topology spread constraints applied to each database pod.
    pub topology_spread_constraints: Option<Vec<TopologySpreadConstraint>>,

    /// Pod disruption budget of the cluster.
    pub pod_disruption_budget: Option<PodDisruptionBudgetSpec>,

    /// Restart all pods concurrently (one-shot restart) when several pods
    /// need restarting, e.g. after a version upgrade. Reduces downtime for
    /// sharded but unreplicated clusters. If unset, the operator restarts
    /// concurrently when no collection is replicated.
    pub restart_all_pods_concurrently: Option<bool>,

    /// If set (> 0), an additional `sleep <value>` is emitted into the pod
    /// startup. The sleep is applied when a pod restarts, it never forces a
    /// restart. Useful to inspect the attached storage of a crash-looping
    /// pod.
    pub startup_delay_seconds: Option<u32>,

    /// Strategy for automatically rebalancing shards across the cluster.
    /// Requires the cluster manager.
    pub rebalance_strategy: Option<RebalanceStrategy>,
}

impl StrataClusterSpec {
    /// Checks for settings the API server schema cannot reject on its own.
    /// A failure blocks the spec from being accepted.
    pub fn validate(&self) -> Result<()> {
        self.resources.validate("spec.resources")
    }

    /// Service-per-node setting with the default applied.
    pub fn effective_service_per_node(&self) -> bool {
        self.service_per_node.unwrap_or(true)
    }

    /// Whether any pause request is present and spec changes must be ignored.
    pub fn is_paused(&self) -> bool {
        !self.pauses.is_empty()
    }
}

/// A pause request placed by a developer for manual maintenance.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pause {
    /// The owner of the pause request.
    #[serde(default)]
    pub owner: String,

    /// The reason for the pause request.
    #[serde(default)]
    pub reason: String,

    /// When the pause request was created, RFC 3339 formatted.
    #[serde(default)]
    pub creation_timestamp: String,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterImage {
    /// The image repository. If unset, the operator config decides.
    pub repository: Option<String>,

    /// The image pull policy. If unset, the operator config decides.
    pub pull_policy: Option<ImagePullPolicy>,

    /// Name of the pull secret for the image.
    pub pull_secret_name: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display)]
pub enum ImagePullPolicy {
    Always,
    IfNotPresent,
    Never,
}

/// Resource limits of a single database node.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    /// CPU limit for each database node.
    #[serde(default)]
    pub cpu: String,

    /// Memory limit for each database node.
    #[serde(default)]
    pub memory: String,

    /// Storage amount for each database node.
    #[serde(default)]
    pub storage: String,

    /// Resource requests for each database node.
    #[serde(default)]
    pub requests: ResourceRequests,
}

impl Resources {
    fn validate(&self, base: &str) -> Result<()> {
        self.cpu
            .parse::<Quantity>()
            .context(InvalidQuantitySnafu {
                path: format!("{base}.cpu"),
            })?;
        self.memory
            .parse::<Quantity>()
            .context(InvalidQuantitySnafu {
                path: format!("{base}.memory"),
            })?;
        self.storage
            .parse::<Quantity>()
            .context(InvalidQuantitySnafu {
                path: format!("{base}.storage"),
            })?;
        self.requests.validate(&format!("{base}.requests"))
    }

    /// CPU request with the fallback to the limit applied.
    pub fn effective_request_cpu(&self) -> &str {
        match self.requests.cpu.as_str() {
            "" => &self.cpu,
            cpu => cpu,
        }
    }

    /// Memory request with the fallback to the limit applied.
    pub fn effective_request_memory(&self) -> &str {
        match self.requests.memory.as_str() {
            "" => &self.memory,
            memory => memory,
        }
    }
}

/// Resource requests of a single database node. Empty values fall back to
/// the corresponding limit.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequests {
    #[serde(default)]
    pub cpu: String,

    #[serde(default)]
    pub memory: String,
}

impl ResourceRequests {
    fn validate(&self, base: &str) -> Result<()> {
        if !self.cpu.is_empty() {
            self.cpu
                .parse::<Quantity>()
                .context(InvalidQuantitySnafu {
                    path: format!("{base}.cpu"),
                })?;
        }
        if !self.memory.is_empty() {
            self.memory
                .parse::<Quantity>()
                .context(InvalidQuantitySnafu {
                    path: format!("{base}.memory"),
                })?;
        }
        Ok(())
    }
}

/// The security context the database process runs as.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    /// User id to run the database process as.
    #[serde(default)]
    pub user: i64,

    /// Group id to run the database process as.
    #[serde(default)]
    pub group: i64,

    /// File system group id to run the database process as.
    pub fs_group: Option<i64>,
}

/// Database configuration settings distributed to all nodes. Field names
/// follow the database's own configuration file format.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterConfiguration {
    /// Default collection settings.
    pub collection: Option<CollectionConfiguration>,

    /// Log level of the database process.
    pub log_level: Option<String>,

    /// Service level settings.
    pub service: Option<ServiceConfiguration>,

    /// TLS settings of the database endpoints.
    pub tls: Option<TlsConfiguration>,

    /// Storage settings.
    pub storage: Option<StorageConfiguration>,

    /// Inference settings, used in the managed cloud only. If unset,
    /// inference is not available to this cluster.
    pub inference: Option<InferenceConfiguration>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectionConfiguration {
    /// Default number of replicas of each shard.
    pub replication_factor: Option<i64>,

    /// How many replicas need to apply an operation for it to be considered
    /// successful.
    pub write_consistency_factor: Option<i64>,

    /// Default parameters for vectors.
    pub vectors: Option<CollectionVectorConfiguration>,

    /// Strict mode settings of a collection.
    pub strict_mode: Option<CollectionStrictModeConfiguration>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectionVectorConfiguration {
    /// Whether vectors are stored in memory or on disk.
    pub on_disk: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectionStrictModeConfiguration {
    /// Maximum number of payload indexes allowed to be created.
    pub max_payload_index_count: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceConfiguration {
    /// Api key of the database instance.
    pub api_key: Option<SecretKeyRef>,

    /// Read-only api key of the database instance.
    pub read_only_api_key: Option<SecretKeyRef>,

    /// Whether to enable JWT RBAC. Defaults to false.
    pub jwt_rbac: Option<bool>,

    /// Whether to hide the JWT dashboard of the embedded UI. Defaults to
    /// false.
    pub hide_jwt_dashboard: Option<bool>,

    /// Whether to enable TLS. Defaults to false.
    pub enable_tls: Option<bool>,

    /// Maximum size of POST data in a single request in megabytes. Defaults
    /// to 32.
    pub max_request_size_mb: Option<i64>,
}

impl ServiceConfiguration {
    pub fn effective_jwt_rbac(&self) -> bool {
        self.jwt_rbac.unwrap_or(false)
    }

    pub fn effective_enable_tls(&self) -> bool {
        self.enable_tls.unwrap_or(false)
    }

    pub fn effective_max_request_size_mb(&self) -> i64 {
        self.max_request_size_mb.unwrap_or(32)
    }
}

/// Reference to the secret holding a piece of database configuration.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeyRef {
    pub secret_key_ref: Option<SecretKeySelector>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfiguration {
    /// Reference to the secret containing the server certificate chain.
    pub cert: Option<SecretKeyRef>,

    /// Reference to the secret containing the server private key.
    pub key: Option<SecretKeyRef>,

    /// Reference to the secret containing the CA certificate.
    #[serde(rename = "caCert")]
    pub ca_cert: Option<SecretKeyRef>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfiguration {
    /// Performance tuning.
    pub performance: Option<StoragePerformanceConfiguration>,

    /// Maximum number of collections allowed to be created.
    #[serde(rename = "maxCollections")]
    pub max_collections: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoragePerformanceConfiguration {
    /// Number of CPUs allocated to the optimizer. 0 selects automatically,
    /// a negative value subtracts from the available CPUs, a positive value
    /// is used as-is.
    pub optimizer_cpu_budget: Option<i64>,

    /// Enables io_uring when rescoring.
    pub async_scorer: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InferenceConfiguration {
    /// Whether inference is enabled for the cluster.
    #[serde(default)]
    pub enabled: bool,
}

/// Ingress exposure of the cluster.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
    /// Whether the ingress is enabled.
    pub enabled: Option<bool>,

    /// Annotations placed on the created ingress object.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Name of the ingress class.
    pub ingress_class_name: Option<String>,

    /// Host the cluster is served under.
    #[serde(default)]
    pub host: String,

    /// Whether to enable TLS on the ingress. The default depends on the
    /// ingress provider configured in the operator.
    pub tls: Option<bool>,

    /// Name of the secret containing the TLS certificate.
    #[serde(default)]
    pub tls_secret_name: String,

    /// NGINX specific ingress settings.
    pub nginx: Option<NginxConfig>,

    /// Traefik specific ingress settings.
    pub traefik: Option<TraefikConfig>,
}

impl Ingress {
    /// TLS setting with the provider default applied.
    pub fn effective_tls(&self, default: bool) -> bool {
        self.tls.unwrap_or(default)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NginxConfig {
    /// Allowed CIDR source ranges for the ingress.
    #[serde(default)]
    pub allowed_source_ranges: Vec<String>,

    /// Host name of the dedicated gRPC ingress.
    pub grpc_host: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraefikConfig {
    /// Allowed CIDR source ranges for the ingress.
    #[serde(default)]
    pub allowed_source_ranges: Vec<String>,

    /// Traefik entry points of the ingress route. If empty, the entry points
    /// configured in the operator are used.
    #[serde(default)]
    pub entry_points: Vec<String>,
}

/// Configuration of the cluster's Kubernetes Service.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesService {
    /// The Service type.
    #[serde(default, rename = "type")]
    pub service_type: ServiceType,

    /// Annotations placed on the Service.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
}

/// Configuration of the cluster's Kubernetes StatefulSet.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesStatefulSet {
    /// Annotations placed on the StatefulSet.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Configuration of the pods of the StatefulSet.
    pub pods: Option<KubernetesPod>,
}

/// Pod template settings of the StatefulSet.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesPod {
    /// Annotations placed on the pods.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Labels placed on the pods.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Extra environment variables injected into the database container.
    #[serde(default)]
    pub extra_env: Vec<EnvVar>,
}

/// Storage class names for the volumes backing a cluster.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClassNames {
    /// Storage class name of the db volume.
    pub db: Option<String>,

    /// Storage class name of the snapshots volume.
    pub snapshots: Option<String>,
}

/// Strategy for automatically rebalancing shards across the cluster.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RebalanceStrategy {
    ByCount,
    BySize,
    ByCountAndSize,
}

/// GPU configuration of the cluster.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gpu {
    /// The GPU type to use. If set, GPU indexing is enabled.
    pub gpu_type: GpuKind,

    /// Force half precision for `f32` values while indexing. The conversion
    /// takes place in GPU memory only and does not affect the storage type.
    #[serde(default)]
    pub force_half_precision: bool,

    /// Substrings matched case-insensitively against the GPU device name.
    /// If empty, all devices are accepted.
    #[serde(default)]
    pub device_filter: Vec<String>,

    /// Explicit GPU devices to use, by index into the list of found devices.
    /// Applied after `device_filter`. If empty, all devices are accepted.
    #[serde(default)]
    pub devices: Vec<String>,

    /// Number of parallel indexes to run on the GPU.
    #[serde(default = "Gpu::default_parallel_indexes")]
    pub parallel_indexes: u16,

    /// Number of GPU "groups" used, i.e. how many points can be indexed in
    /// parallel. The optimal value depends on the GPU model. Do not change
    /// this unless you know what you are doing.
    pub groups_count: Option<u16>,

    /// Whether integrated GPUs may be used.
    #[serde(default)]
    pub allow_integrated: bool,
}

impl Gpu {
    const fn default_parallel_indexes() -> u16 {
        1
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GpuKind {
    Nvidia,
    Amd,
}

/// Condition types reported on a cluster, next to the coarse-grained phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum ClusterConditionType {
    AcceptingConnection,
    RecoveryMode,
}

/// The observed state of a [`StrataCluster`]. Written exclusively by the
/// control loop.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrataClusterStatus {
    /// The phase the cluster is in.
    pub phase: Option<ClusterPhase>,

    /// The reason for the current phase.
    pub reason: Option<String>,

    /// Number of available nodes in the cluster.
    #[serde(default)]
    pub available_nodes: u16,

    /// Indexes of the individual nodes in the cluster. The length matches
    /// `available_nodes`.
    #[serde(default)]
    pub available_node_indexes: Vec<u16>,

    /// The node used for bootstrapping a new node. Must be one of
    /// `available_node_indexes`; defaults to the first one.
    pub bootstrap_node: Option<u16>,

    /// Results of the different checks on the cluster.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Status of the individual nodes, keyed by pod name.
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeStatus>,

    /// The version in use by the cluster. Can trail the spec, because version
    /// updates are applied along the ordered update path.
    #[serde(default)]
    pub version: String,

    /// Long-running operations on the cluster, retained for audit until
    /// superseded.
    #[serde(default)]
    pub operations: OperationLog,

    /// Fingerprint of the restart-relevant spec subset as of the last time
    /// the control loop acted on it.
    pub last_observed_fingerprint: Option<Fingerprint>,
}

impl StrataClusterStatus {
    /// Bootstrap node with the default applied.
    pub fn effective_bootstrap_node(&self) -> Option<u16> {
        self.bootstrap_node
            .or_else(|| self.available_node_indexes.first().copied())
    }
}

/// Status of a single database node.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// Name of the node.
    #[serde(default)]
    pub name: String,

    /// When the node started, RFC 3339 formatted.
    #[serde(default, rename = "started_at")]
    pub started_at: String,

    /// Pod condition states of the node.
    #[serde(default)]
    pub state: BTreeMap<String, String>,

    /// The database version running on the node.
    #[serde(default)]
    pub version: String,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn minimal_spec() -> StrataClusterSpec {
        serde_json::from_value(serde_json::json!({
            "id": "test-cluster",
            "version": "v1.12.0",
            "size": 1,
            "resources": {"cpu": "1", "memory": "1Gi", "storage": "10Gi"},
        }))
        .expect("minimal spec must deserialize")
    }

    #[test]
    fn empty_resources_are_rejected() {
        let err = Resources::default()
            .validate("spec.resources")
            .expect_err("empty resources must not validate");

        assert_eq!(err.to_string(), "invalid quantity at spec.resources.cpu");
    }

    #[test]
    fn malformed_request_is_rejected_with_path() {
        let mut spec = minimal_spec();
        spec.resources.requests.memory = "10 elephants".to_owned();

        let err = spec.validate().expect_err("malformed request must not validate");
        assert_eq!(
            err.to_string(),
            "invalid quantity at spec.resources.requests.memory"
        );
    }

    #[test]
    fn minimal_spec_validates() {
        minimal_spec().validate().expect("minimal spec must validate");
    }

    #[rstest]
    #[case::unset(None, true)]
    #[case::disabled(Some(false), false)]
    #[case::enabled(Some(true), true)]
    fn service_per_node_default(#[case] value: Option<bool>, #[case] expected: bool) {
        let mut spec = minimal_spec();
        spec.service_per_node = value;

        assert_eq!(spec.effective_service_per_node(), expected);
    }

    #[test]
    fn request_falls_back_to_limit() {
        let mut spec = minimal_spec();
        assert_eq!(spec.resources.effective_request_cpu(), "1");

        spec.resources.requests.cpu = "250m".to_owned();
        assert_eq!(spec.resources.effective_request_cpu(), "250m");
        assert_eq!(spec.resources.effective_request_memory(), "1Gi");
    }

    #[test]
    fn bootstrap_node_defaults_to_first_index() {
        let mut status = StrataClusterStatus {
            available_nodes: 2,
            available_node_indexes: vec![3, 5],
            ..StrataClusterStatus::default()
        };
        assert_eq!(status.effective_bootstrap_node(), Some(3));

        status.bootstrap_node = Some(5);
        assert_eq!(status.effective_bootstrap_node(), Some(5));
    }

    #[test]
    fn wire_names_are_stable() {
        let cluster: StrataCluster = serde_yaml::from_str(
            r#"
            apiVersion: stratadb.io/v1
            kind: StrataCluster
            metadata:
              name: test-cluster
            spec:
              id: test-cluster
              version: v1.12.0
              size: 3
              servicePerNode: false
              resources:
                cpu: "2"
                memory: 4Gi
                storage: 50Gi
                requests:
                  cpu: 500m
              config:
                log_level: INFO
                service:
                  jwt_rbac: true
                storage:
                  maxCollections: 500
              ingress:
                enabled: true
                annotations:
                  external-dns.alpha.kubernetes.io/hostname: db.example.com
              rebalanceStrategy: by_count_and_size
            "#,
        )
        .expect("manifest must deserialize");

        assert_eq!(cluster.spec.size, 3);
        assert_eq!(cluster.spec.service_per_node, Some(false));
        assert_eq!(
            cluster.spec.rebalance_strategy,
            Some(RebalanceStrategy::ByCountAndSize)
        );

        let config = cluster.spec.config.as_ref().expect("config must be set");
        assert!(config.service.as_ref().expect("service must be set").effective_jwt_rbac());
        assert_eq!(
            config.storage.as_ref().expect("storage must be set").max_collections,
            Some(500)
        );
    }
}
