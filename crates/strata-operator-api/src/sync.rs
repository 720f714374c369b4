//! Dirty tracking between an entity, the entity manager and the cloud
//! backend.
//!
//! The reconcile loop needs exactly two answers per entity: does the manager
//! have to be invoked for the spec side, does the backend have to be pushed
//! the status side. Both are answered by comparing content fingerprints; the
//! two tracks are fully independent, so a failing spec push never blocks a
//! status push and vice versa.

use strata_shared::fingerprint::{self, changed};
use tracing::debug;

use crate::crd::entity::{StrataEntity, StrataEntityStatus};

impl StrataEntity {
    /// Recomputes `spec_hash` and `status_hash` from the current content.
    ///
    /// Call once per observation, before evaluating the sync predicates. The
    /// status-hash input is the status with all four hash fields cleared, so
    /// recording the hashes (or marking a track synced) never changes the
    /// hash itself.
    pub fn refresh_sync_hashes(&mut self) -> fingerprint::Result<()> {
        let spec_hash = fingerprint::fingerprint(&self.spec)?;

        let status = self.status.get_or_insert_with(StrataEntityStatus::default);
        let status_hash = {
            let mut input = status.clone();
            input.spec_hash = None;
            input.status_hash = None;
            input.last_used_spec_hash = None;
            input.last_used_status_hash = None;
            fingerprint::fingerprint(&input)?
        };

        debug!(
            entity = %self.spec.id,
            spec_hash = %spec_hash,
            status_hash = %status_hash,
            "refreshed entity sync hashes"
        );

        status.spec_hash = Some(spec_hash);
        status.status_hash = Some(status_hash);

        Ok(())
    }

    /// Whether the entity manager has to be invoked: the spec content
    /// changed since the last successful manager call. An entity whose
    /// hashes were never computed conservatively needs a sync.
    pub fn needs_manager_sync(&self) -> bool {
        self.status.as_ref().is_none_or(|status| {
            status
                .spec_hash
                .as_ref()
                .is_none_or(|current| changed(current, status.last_used_spec_hash.as_ref()))
        })
    }

    /// Whether the cloud backend has to be pushed: the status content
    /// changed since the last successful backend push.
    pub fn needs_backend_sync(&self) -> bool {
        self.status.as_ref().is_none_or(|status| {
            status
                .status_hash
                .as_ref()
                .is_none_or(|current| changed(current, status.last_used_status_hash.as_ref()))
        })
    }

    /// Records that the entity manager call durably succeeded for the
    /// current spec content. Must not be called on mere intent.
    pub fn mark_manager_synced(&mut self) {
        if let Some(status) = &mut self.status {
            status.last_used_spec_hash = status.spec_hash.clone();
        }
    }

    /// Records that the backend push durably succeeded for the current
    /// status content. Must not be called on mere intent.
    pub fn mark_backend_synced(&mut self) {
        if let Some(status) = &mut self.status {
            status.last_used_status_hash = status.status_hash.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::crd::entity::{EntityPhase, StrataEntitySpec};

    fn entity() -> StrataEntity {
        let spec: StrataEntitySpec = serde_json::from_value(json!({
            "id": "5fc12f3a-0f9e-4a62-9437-2d5c4a2333d5",
            "entityType": "hybrid-cloud-environment",
            "payload": {"name": "production", "nodes": 3},
        }))
        .expect("spec must deserialize");

        StrataEntity::new("production", spec)
    }

    #[test]
    fn fresh_entities_need_both_syncs() {
        let entity = entity();

        assert!(entity.needs_manager_sync());
        assert!(entity.needs_backend_sync());
    }

    #[test]
    fn marking_synced_clears_the_predicate_until_content_changes() {
        let mut entity = entity();
        entity.refresh_sync_hashes().expect("hashes must refresh");

        entity.mark_manager_synced();
        assert!(!entity.needs_manager_sync());

        // an unrelated payload touch flips the predicate back
        entity.spec.payload = Some(json!({"name": "production", "nodes": 5}));
        entity.refresh_sync_hashes().expect("hashes must refresh");
        assert!(entity.needs_manager_sync());
    }

    #[test]
    fn manager_and_backend_tracks_are_independent() {
        let mut entity = entity();
        entity.refresh_sync_hashes().expect("hashes must refresh");

        // only the backend push succeeded
        entity.mark_backend_synced();

        assert!(entity.needs_manager_sync());
        assert!(!entity.needs_backend_sync());

        // a status change does not disturb the manager track
        entity
            .status
            .as_mut()
            .expect("status must be set")
            .phase = Some(EntityPhase::Ready);
        entity.refresh_sync_hashes().expect("hashes must refresh");

        assert!(entity.needs_manager_sync());
        assert!(entity.needs_backend_sync());
    }

    #[test]
    fn hash_fields_are_excluded_from_their_own_input() {
        let mut entity = entity();

        entity.refresh_sync_hashes().expect("hashes must refresh");
        let first = entity
            .status
            .as_ref()
            .and_then(|status| status.status_hash.clone())
            .expect("status hash must be set");

        // recording hashes and marking tracks synced must not feed back
        entity.mark_manager_synced();
        entity.mark_backend_synced();
        entity.refresh_sync_hashes().expect("hashes must refresh");

        let second = entity
            .status
            .as_ref()
            .and_then(|status| status.status_hash.clone())
            .expect("status hash must be set");

        assert_eq!(first, second);
    }
}
