//! The registry of custom resource definitions served by the operator.
//!
//! The registry is constructed explicitly at process startup and passed by
//! reference to whatever needs it (CRD installers, schema dumps). There is no
//! global registry populated by import side effects.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;
use tracing::debug;

use crate::crd::{
    cluster::StrataCluster, entity::StrataEntity, region::StrataCloudRegion,
    release::StrataRelease, restore::StrataClusterRestore,
    scheduled_snapshot::StrataClusterScheduledSnapshot, snapshot::StrataClusterSnapshot,
};

/// All custom resource definitions served by the operator.
#[derive(Debug)]
pub struct CrdRegistry {
    crds: Vec<CustomResourceDefinition>,
}

impl CrdRegistry {
    /// Assembles the definitions of every resource kind this crate declares.
    pub fn new() -> Self {
        let crds = vec![
            StrataCluster::crd(),
            StrataClusterSnapshot::crd(),
            StrataClusterScheduledSnapshot::crd(),
            StrataClusterRestore::crd(),
            StrataRelease::crd(),
            StrataEntity::crd(),
            StrataCloudRegion::crd(),
        ];
        debug!(count = crds.len(), "assembled CRD registry");

        Self { crds }
    }

    /// All registered definitions, in installation order.
    pub fn definitions(&self) -> &[CustomResourceDefinition] {
        &self.crds
    }

    /// Looks up a definition by its kind name, e.g. `"StrataCluster"`.
    pub fn get(&self, kind: &str) -> Option<&CustomResourceDefinition> {
        self.crds.iter().find(|crd| crd.spec.names.kind == kind)
    }

    /// The kind names of all registered definitions.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.crds.iter().map(|crd| crd.spec.names.kind.as_str())
    }
}

impl Default for CrdRegistry {
    fn default() -> Self {
        Self::new()
    }
}
