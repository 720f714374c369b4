//! Drives a cluster through the create → scale → settle flow the way the
//! control loop does, checking that fingerprints, phases and operation
//! records line up.

use std::collections::BTreeSet;

use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use strata_operator_api::{
    crd::cluster::{Ingress, StrataCluster, StrataClusterSpec, StrataClusterStatus},
    lifecycle::{self, ActionOutcome, ClusterAction, ClusterPhase},
    operation::{OperationPhase, StepPhase},
    restart,
};

fn now() -> Time {
    Time(Utc::now())
}

#[test]
fn create_scale_settle() {
    let spec: StrataClusterSpec = serde_json::from_value(serde_json::json!({
        "id": "test-cluster",
        "version": "v1.12.0",
        "size": 1,
        "resources": {"cpu": "1", "memory": "1Gi", "storage": "10Gi"},
    }))
    .expect("spec must deserialize");
    spec.validate().expect("spec must validate");

    let mut cluster = StrataCluster::new("test-cluster", spec);

    // First observation: no prior status, the cluster enters Creating and
    // the bootstrap fingerprint is recorded after the work started.
    let first_fingerprint = restart::restart_required(&cluster)
        .expect("decision must not fail")
        .expect("first observation must require action");

    cluster.status = Some(StrataClusterStatus {
        phase: Some(ClusterPhase::initial()),
        version: "v1.12.0".to_owned(),
        last_observed_fingerprint: Some(first_fingerprint.clone()),
        ..StrataClusterStatus::default()
    });

    // Creation finishes without error.
    let settled = lifecycle::next_phase(ClusterPhase::Creating, ActionOutcome::Succeeded)
        .expect("creating must accept an outcome");
    assert_eq!(settled, ClusterPhase::Healthy);
    set_phase(&mut cluster, settled);

    // A size change arrives: the restart-relevant content changes and the
    // only pending action maps to the Scaling phase.
    cluster.spec.size = 2;
    let scale_fingerprint = restart::restart_required(&cluster)
        .expect("decision must not fail")
        .expect("a size change must require action");
    assert_ne!(scale_fingerprint, first_fingerprint);

    let actions = BTreeSet::from([ClusterAction::Scale]);
    let transient = lifecycle::combined_transient_phase(&actions)
        .expect("one pending action must map to a phase");
    assert_eq!(transient, ClusterPhase::Scaling);
    set_phase(&mut cluster, transient);

    // Track the scaling work, then persist the new fingerprint: the action
    // is durably initiated now.
    let kind = ClusterAction::Scale
        .operation_kind()
        .expect("scaling is tracked in the operation log");
    let status = cluster.status.as_mut().expect("status must be set");
    let operation = status.operations.start(kind, now());
    status
        .operations
        .record_step(operation, "provision-node", StepPhase::InProgress, None)
        .expect("step must record");
    status.last_observed_fingerprint = Some(scale_fingerprint.clone());

    // The scaling operation completes, the cluster settles again.
    status
        .operations
        .record_step(operation, "provision-node", StepPhase::Completed, None)
        .expect("step must update");
    status
        .operations
        .complete(operation, ActionOutcome::Succeeded, None, now())
        .expect("operation must complete");

    let record = status.operations.get(operation).expect("operation must be retained");
    assert_eq!(record.phase, OperationPhase::Completed);
    assert!(!record.has_failed_steps());

    let settled = lifecycle::next_phase(ClusterPhase::Scaling, ActionOutcome::Succeeded)
        .expect("scaling must accept an outcome");
    assert_eq!(settled, ClusterPhase::Healthy);
    set_phase(&mut cluster, settled);

    // A second update only touches an ingress annotation: no restart, no
    // phase transition, the recorded fingerprint stays.
    cluster.spec.ingress = Some(Ingress {
        enabled: Some(true),
        annotations: [(
            "external-dns.alpha.kubernetes.io/hostname".to_owned(),
            "db.example.com".to_owned(),
        )]
        .into(),
        ingress_class_name: None,
        host: "db.example.com".to_owned(),
        tls: None,
        tls_secret_name: String::new(),
        nginx: None,
        traefik: None,
    });

    assert_eq!(
        restart::restart_required(&cluster).expect("decision must not fail"),
        None
    );
    let status = cluster.status.as_ref().expect("status must be set");
    assert_eq!(status.phase, Some(ClusterPhase::Healthy));
    assert_eq!(status.last_observed_fingerprint, Some(scale_fingerprint));
}

fn set_phase(cluster: &mut StrataCluster, phase: ClusterPhase) {
    cluster
        .status
        .as_mut()
        .expect("status must be set")
        .phase = Some(phase);
}
