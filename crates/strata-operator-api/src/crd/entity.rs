//! The `StrataEntity` resource: a generic, opaquely-typed entity synchronized
//! between the cluster and the cloud control plane.
//!
//! The operator does not interpret entity payloads. It tracks, per entity,
//! whether the spec side needs to be pushed to the entity manager and whether
//! the status side needs to be pushed to the cloud backend; see
//! [`sync`][crate::sync] for the protocol.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strata_shared::{Fingerprint, payload};

use crate::crd::raw_object_schema;

/// A generic entity managed through the cloud control plane.
#[derive(CustomResource, Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "stratadb.io",
    version = "v1",
    kind = "StrataEntity",
    plural = "strataentities",
    shortname = "se",
    status = "StrataEntityStatus",
    namespaced,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.entityType"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StrataEntitySpec {
    /// The unique identifier of the entity, in UUID format.
    #[serde(default)]
    pub id: String,

    /// The type of the entity.
    #[serde(default)]
    pub entity_type: String,

    /// The identifier of the cluster this entity belongs to, if any.
    #[serde(default)]
    pub cluster_id: String,

    /// When the entity was created.
    pub created_at: Option<Time>,

    /// When the entity was last updated.
    pub last_updated_at: Option<Time>,

    /// When deletion of the entity started. Unset while the entity is live.
    pub deleted_at: Option<Time>,

    /// Generic payload of this entity.
    #[serde(default)]
    #[schemars(schema_with = "raw_object_schema")]
    pub payload: Option<serde_json::Value>,
}

impl StrataEntitySpec {
    /// The payload as the structured value crossing the backend boundary.
    /// Absent payloads convert to an explicit empty structure.
    pub fn payload_for_backend(&self) -> payload::Result<prost_types::Struct> {
        payload::to_protobuf_struct(self.payload.as_ref())
    }

    /// Replaces the payload with the given structured value. An absent value
    /// stores an explicit empty object.
    pub fn set_payload_from_backend(
        &mut self,
        value: Option<prost_types::Struct>,
    ) -> payload::Result<()> {
        self.payload = Some(payload::to_json_payload(value)?);
        Ok(())
    }
}

/// The phase of an entity. Serialized phase names are part of the wire
/// contract.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum EntityPhase {
    Creating,
    Ready,
    Failing,
    Deleting,
    Deleted,
}

/// The result of the last reconcile of an entity against its manager.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum EntityResult {
    Ok,
    Pending,
    Error,
}

/// The last result from handing an entity to its manager.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResultStatus {
    /// The result of the last reconcile of the entity.
    pub result: Option<EntityResult>,

    /// The reason of the result, e.g. in case of an error. Conversion
    /// failures of the payload are surfaced here instead of being dropped.
    #[serde(default)]
    pub reason: String,

    /// The optional payload of the status.
    #[serde(default)]
    #[schemars(schema_with = "raw_object_schema")]
    pub payload: Option<serde_json::Value>,
}

impl EntityResultStatus {
    /// The status payload as the structured value crossing the backend
    /// boundary.
    pub fn payload_for_backend(&self) -> payload::Result<prost_types::Struct> {
        payload::to_protobuf_struct(self.payload.as_ref())
    }

    /// Replaces the status payload with the given structured value.
    pub fn set_payload_from_backend(
        &mut self,
        value: Option<prost_types::Struct>,
    ) -> payload::Result<()> {
        self.payload = Some(payload::to_json_payload(value)?);
        Ok(())
    }
}

/// The observed state of a [`StrataEntity`]. Written exclusively by the
/// control loop.
///
/// The four fingerprints drive the dirty-tracking protocol: `spec_hash` /
/// `status_hash` describe the current content, `last_used_spec_hash` /
/// `last_used_status_hash` the content as of the last successful push to the
/// entity manager resp. the cloud backend.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrataEntityStatus {
    /// The current phase of the entity.
    pub phase: Option<EntityPhase>,

    /// The last result from the invocation of the entity manager.
    #[serde(default)]
    pub result: EntityResultStatus,

    /// When the status was last updated.
    pub last_updated_at: Option<Time>,

    /// Fingerprint of the current spec.
    pub spec_hash: Option<Fingerprint>,

    /// Fingerprint of the current status, excluding the hash fields
    /// themselves.
    pub status_hash: Option<Fingerprint>,

    /// Spec fingerprint as of the last successful push to the entity
    /// manager.
    pub last_used_spec_hash: Option<Fingerprint>,

    /// Status fingerprint as of the last successful push to the cloud
    /// backend.
    pub last_used_status_hash: Option<Fingerprint>,
}
