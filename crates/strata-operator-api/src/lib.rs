//! API types and the reconcile core of the StrataDB Kubernetes operator.
//!
//! The crate declares the custom resources served by the operator ([`crd`])
//! together with the pieces the control loop uses to act on them
//! idempotently: restart-relevance fingerprinting ([`restart`]), the cluster
//! phase state machine ([`lifecycle`]), long-running operation tracking
//! ([`operation`]) and the dirty-tracking protocol for entities synchronized
//! with the cloud control plane ([`sync`]).

pub mod crd;
pub mod lifecycle;
pub mod operation;
pub mod quantity;
pub mod registry;
pub mod restart;
pub mod sync;

// External re-exports
pub use k8s_openapi;
pub use kube;
pub use schemars;
// Internal re-exports
pub use strata_shared as shared;
