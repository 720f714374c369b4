//! Custom resource declarations served by the StrataDB operator.
//!
//! Specs are owned by the resource owner (user or cloud API); statuses are
//! owned exclusively by the control loop. Field names and enum string values
//! are part of the wire contract and must remain stable.

pub mod cluster;
pub mod entity;
pub mod region;
pub mod release;
pub mod restore;
pub mod scheduled_snapshot;
pub mod snapshot;

/// API group of all resources in this crate.
pub const API_GROUP: &str = "stratadb.io";

/// Served API version of all resources in this crate.
pub const API_VERSION: &str = "v1";

/// Schema for fields holding arbitrary JSON objects. The API server keeps
/// unknown fields instead of pruning them.
pub fn raw_object_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true,
    })
}
