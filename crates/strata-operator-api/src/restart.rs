//! Restart-relevance fingerprinting of a cluster spec.
//!
//! Deciding whether an observed spec change requires restarting running
//! database pods is the most error-prone part of the reconcile protocol:
//! missing a field that matters causes missed restarts, keeping a field that
//! does not matter causes restart storms. [`RestartProjection`] makes the
//! field subset explicit in one place.

use std::collections::BTreeMap;

use serde::Serialize;
use strata_shared::{Fingerprint, fingerprint};
use tracing::debug;

use crate::crd::cluster::{KubernetesStatefulSet, StrataCluster, StrataClusterSpec};

/// The projection of a cluster onto the fields whose identity decides
/// whether running database pods must be restarted.
///
/// Derived on demand as fingerprint input, never persisted. Neutralized
/// fields, in spec order: service-per-node, cluster-manager wiring, suspend,
/// pause requests, ingress, the Service, StatefulSet annotations (pod-level
/// StatefulSet settings are kept, they land in the pod template), storage
/// class names, the pod disruption budget, the restart concurrency policy,
/// the startup delay (applied when a pod restarts, never forces one) and the
/// rebalance strategy.
///
/// One value is substituted instead of neutralized: `version` is taken from
/// the status, because version changes flow through the ordered update path
/// and must not trigger a restart by themselves.
#[derive(Debug, Serialize)]
pub struct RestartProjection(StrataClusterSpec);

impl RestartProjection {
    pub fn of(cluster: &StrataCluster) -> Self {
        let mut spec = cluster.spec.clone();

        spec.version = cluster
            .status
            .as_ref()
            .map(|status| status.version.clone())
            .unwrap_or_default();

        spec.service_per_node = None;
        spec.cluster_manager = None;
        spec.suspend = false;
        spec.pauses.clear();
        spec.ingress = None;
        spec.service = None;
        spec.stateful_set = spec.stateful_set.take().and_then(pod_template_settings);
        spec.storage_class_names = None;
        spec.pod_disruption_budget = None;
        spec.restart_all_pods_concurrently = None;
        spec.startup_delay_seconds = None;
        spec.rebalance_strategy = None;

        Self(spec)
    }

    pub fn fingerprint(&self) -> fingerprint::Result<Fingerprint> {
        fingerprint::fingerprint(&self.0)
    }
}

/// Keeps the parts of the StatefulSet configuration that reach the pod
/// template. A StatefulSet carrying only annotations reduces to the neutral
/// value.
fn pod_template_settings(stateful_set: KubernetesStatefulSet) -> Option<KubernetesStatefulSet> {
    stateful_set.pods.map(|pods| KubernetesStatefulSet {
        annotations: BTreeMap::new(),
        pods: Some(pods),
    })
}

/// Decides whether the cluster's restart-relevant content differs from the
/// fingerprint recorded on the status.
///
/// Returns the new fingerprint to persist when a restart is required, `None`
/// when nothing relevant changed. A cluster without a recorded fingerprint
/// (first reconciliation) always requires action. Callers must persist the
/// returned fingerprint only after the restart has been durably initiated,
/// so that a crash in between re-triggers the restart instead of skipping
/// it.
pub fn restart_required(cluster: &StrataCluster) -> fingerprint::Result<Option<Fingerprint>> {
    let current = RestartProjection::of(cluster).fingerprint()?;
    let last_observed = cluster
        .status
        .as_ref()
        .and_then(|status| status.last_observed_fingerprint.as_ref());

    if fingerprint::changed(&current, last_observed) {
        debug!(
            cluster = %cluster.spec.id,
            fingerprint = %current,
            "restart-relevant change detected"
        );
        Ok(Some(current))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::cluster::{Ingress, Pause, StorageClassNames, StrataClusterStatus};

    fn cluster() -> StrataCluster {
        let spec: StrataClusterSpec = serde_json::from_value(serde_json::json!({
            "id": "test-cluster",
            "version": "v1.12.0",
            "size": 1,
            "resources": {"cpu": "1", "memory": "1Gi", "storage": "10Gi"},
        }))
        .expect("spec must deserialize");

        let mut cluster = StrataCluster::new("test-cluster", spec);
        cluster.status = Some(StrataClusterStatus {
            version: "v1.12.0".to_owned(),
            ..StrataClusterStatus::default()
        });

        cluster
    }

    fn fingerprint_of(cluster: &StrataCluster) -> Fingerprint {
        RestartProjection::of(cluster)
            .fingerprint()
            .expect("projection must fingerprint")
    }

    #[test]
    fn insensitive_fields_do_not_change_the_fingerprint() {
        let plain = cluster();
        let baseline = fingerprint_of(&plain);

        let mut decorated = cluster();
        decorated.spec.service_per_node = Some(false);
        decorated.spec.pauses.push(Pause {
            owner: "dev@stratadb.io".to_owned(),
            reason: "maintenance".to_owned(),
            creation_timestamp: "2025-06-01T12:00:00Z".to_owned(),
        });
        decorated.spec.ingress = Some(Ingress {
            enabled: Some(true),
            annotations: [("a".to_owned(), "b".to_owned())].into(),
            ingress_class_name: None,
            host: "db.example.com".to_owned(),
            tls: None,
            tls_secret_name: String::new(),
            nginx: None,
            traefik: None,
        });
        decorated.spec.storage_class_names = Some(StorageClassNames {
            db: Some("fast".to_owned()),
            snapshots: None,
        });
        decorated.spec.startup_delay_seconds = Some(30);

        assert_eq!(fingerprint_of(&decorated), baseline);
    }

    #[test]
    fn sensitive_fields_change_the_fingerprint() {
        let baseline = fingerprint_of(&cluster());

        let mut resized = cluster();
        resized.spec.size = 2;
        assert_ne!(fingerprint_of(&resized), baseline);

        let mut retuned = cluster();
        retuned.spec.resources.memory = "2Gi".to_owned();
        assert_ne!(fingerprint_of(&retuned), baseline);
    }

    #[test]
    fn flipping_an_insensitive_flag_twice_restores_the_fingerprint() {
        let mut cluster = cluster();
        let baseline = fingerprint_of(&cluster);

        cluster.spec.suspend = true;
        cluster.spec.suspend = false;

        assert_eq!(fingerprint_of(&cluster), baseline);
    }

    #[test]
    fn version_is_read_from_the_status() {
        let baseline = fingerprint_of(&cluster());

        // a spec version bump alone goes through the update path
        let mut updated_spec = cluster();
        updated_spec.spec.version = "v1.13.0".to_owned();
        assert_eq!(fingerprint_of(&updated_spec), baseline);

        // the rollout becomes restart-relevant once the status follows
        let mut updated_status = cluster();
        updated_status
            .status
            .as_mut()
            .expect("status must be set")
            .version = "v1.13.0".to_owned();
        assert_ne!(fingerprint_of(&updated_status), baseline);
    }

    #[test]
    fn first_reconciliation_always_requires_action() {
        let cluster = cluster();

        let fingerprint = restart_required(&cluster)
            .expect("decision must not fail")
            .expect("absent recorded fingerprint must require action");

        // once recorded, the same content requires no further action
        let mut acted = cluster;
        acted
            .status
            .as_mut()
            .expect("status must be set")
            .last_observed_fingerprint = Some(fingerprint);
        assert_eq!(restart_required(&acted).expect("decision must not fail"), None);
    }
}
