//! The coarse-grained lifecycle of a managed cluster.
//!
//! A cluster is in exactly one [`ClusterPhase`] at any time. Transient phases
//! describe work in flight and exit either into their steady-state success
//! phase or into their paired failure phase; the control loop alone decides
//! which, based on whether the underlying action completed without error.
//! Categorization is carried as data ([`PhaseCategory`]), never derived from
//! the phase's string form.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, Snafu};

use crate::operation::OperationKind;

#[derive(Debug, Snafu)]
pub enum TransitionError {
    #[snafu(display("phase {phase} is not transient, there is no action outcome to apply"))]
    NotTransient { phase: ClusterPhase },
}

/// The phase of a managed cluster. Serialized phase names are part of the
/// wire contract.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    JsonSchema,
    PartialEq,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
pub enum ClusterPhase {
    Creating,
    Updating,
    Scaling,
    Upgrading,
    Suspending,
    Resuming,

    FailedToCreate,
    FailedToUpdate,
    FailedToScale,
    FailedToUpgrade,
    FailedToSuspend,
    FailedToResume,

    Healthy,
    NotReady,
    Suspended,
    RecoveryMode,
    ManualMaintenance,
}

/// Grouping of [`ClusterPhase`]s by their role in the state machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum PhaseCategory {
    /// Work is in flight, the phase will be exited once it finishes.
    Transient,

    /// A rest point. Left only by new spec changes, external events or
    /// operator intervention.
    SteadyState,

    /// A transient phase's work failed. Left by a retry or a spec change.
    Failure,
}

/// The outcome the control loop observed for the action a transient phase
/// stands for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionOutcome {
    Succeeded,
    Failed,
}

impl ClusterPhase {
    /// The phase a resource enters when it is first observed without any
    /// prior status.
    #[must_use]
    pub fn initial() -> Self {
        Self::Creating
    }

    pub fn category(&self) -> PhaseCategory {
        match self {
            Self::Creating
            | Self::Updating
            | Self::Scaling
            | Self::Upgrading
            | Self::Suspending
            | Self::Resuming => PhaseCategory::Transient,
            Self::FailedToCreate
            | Self::FailedToUpdate
            | Self::FailedToScale
            | Self::FailedToUpgrade
            | Self::FailedToSuspend
            | Self::FailedToResume => PhaseCategory::Failure,
            Self::Healthy
            | Self::NotReady
            | Self::Suspended
            | Self::RecoveryMode
            | Self::ManualMaintenance => PhaseCategory::SteadyState,
        }
    }

    /// The steady-state phase a transient phase enters when its action
    /// completes without error. `None` for non-transient phases.
    pub fn success_phase(&self) -> Option<Self> {
        let next = match self {
            Self::Creating | Self::Updating | Self::Scaling | Self::Upgrading | Self::Resuming => {
                Self::Healthy
            }
            Self::Suspending => Self::Suspended,
            _ => return None,
        };

        Some(next)
    }

    /// The failure phase a transient phase enters when its action fails.
    /// `None` for non-transient phases.
    pub fn failure_phase(&self) -> Option<Self> {
        let next = match self {
            Self::Creating => Self::FailedToCreate,
            Self::Updating => Self::FailedToUpdate,
            Self::Scaling => Self::FailedToScale,
            Self::Upgrading => Self::FailedToUpgrade,
            Self::Suspending => Self::FailedToSuspend,
            Self::Resuming => Self::FailedToResume,
            _ => return None,
        };

        Some(next)
    }

    /// The transient phase to re-enter when retrying a failed action.
    /// `None` for non-failure phases. Re-entry into a transient phase is
    /// always legal, from any phase.
    pub fn retry_phase(&self) -> Option<Self> {
        let next = match self {
            Self::FailedToCreate => Self::Creating,
            Self::FailedToUpdate => Self::Updating,
            Self::FailedToScale => Self::Scaling,
            Self::FailedToUpgrade => Self::Upgrading,
            Self::FailedToSuspend => Self::Suspending,
            Self::FailedToResume => Self::Resuming,
            _ => return None,
        };

        Some(next)
    }
}

/// Applies an action outcome to a transient phase and returns the successor
/// phase. Fails for non-transient phases, which have no action in flight.
pub fn next_phase(
    current: ClusterPhase,
    outcome: ActionOutcome,
) -> Result<ClusterPhase, TransitionError> {
    let next = match outcome {
        ActionOutcome::Succeeded => current.success_phase(),
        ActionOutcome::Failed => current.failure_phase(),
    };

    next.context(NotTransientSnafu { phase: current })
}

/// An action the control loop derives from observing a spec change or an
/// external event.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, strum::Display)]
pub enum ClusterAction {
    Create,
    Update,
    Scale,
    Upgrade,
    Suspend,
    Resume,
}

impl ClusterAction {
    /// The transient phase representing this action alone.
    pub fn transient_phase(&self) -> ClusterPhase {
        match self {
            Self::Create => ClusterPhase::Creating,
            Self::Update => ClusterPhase::Updating,
            Self::Scale => ClusterPhase::Scaling,
            Self::Upgrade => ClusterPhase::Upgrading,
            Self::Suspend => ClusterPhase::Suspending,
            Self::Resume => ClusterPhase::Resuming,
        }
    }

    /// The operation record kind tracking this action's progress, for actions
    /// reported in the operation log.
    pub fn operation_kind(&self) -> Option<OperationKind> {
        match self {
            Self::Create => Some(OperationKind::Creation),
            Self::Scale => Some(OperationKind::HorizontalScaling),
            Self::Upgrade => Some(OperationKind::VersionUpdate),
            Self::Update | Self::Suspend | Self::Resume => None,
        }
    }
}

/// Serializes concurrent triggers into a single transient phase.
///
/// A cluster never runs two transient phases at the same time. A single
/// pending action maps to its dedicated phase; two or more (e.g. a size
/// change and a version change observed together) collapse into
/// [`ClusterPhase::Updating`], the phase whose action set is open-ended.
pub fn combined_transient_phase(actions: &BTreeSet<ClusterAction>) -> Option<ClusterPhase> {
    match actions.len() {
        0 => None,
        1 => actions.first().map(ClusterAction::transient_phase),
        _ => Some(ClusterPhase::Updating),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn transient_phases_have_distinct_successors() {
        for phase in ClusterPhase::iter() {
            match phase.category() {
                PhaseCategory::Transient => {
                    let success = phase.success_phase().expect("transient phase needs a success phase");
                    let failure = phase.failure_phase().expect("transient phase needs a failure phase");

                    assert_ne!(success, failure);
                    assert_eq!(success.category(), PhaseCategory::SteadyState);
                    assert_eq!(failure.category(), PhaseCategory::Failure);
                }
                PhaseCategory::SteadyState | PhaseCategory::Failure => {
                    assert_eq!(phase.success_phase(), None);
                    assert_eq!(phase.failure_phase(), None);
                }
            }
        }
    }

    #[test]
    fn every_failure_phase_can_be_retried() {
        for phase in ClusterPhase::iter().filter(|p| p.category() == PhaseCategory::Failure) {
            let retry = phase.retry_phase().expect("failure phase needs a retry phase");

            assert_eq!(retry.category(), PhaseCategory::Transient);
            assert_eq!(retry.failure_phase(), Some(phase));
        }
    }

    #[rstest]
    #[case::create_ok(ClusterPhase::Creating, ActionOutcome::Succeeded, ClusterPhase::Healthy)]
    #[case::create_failed(ClusterPhase::Creating, ActionOutcome::Failed, ClusterPhase::FailedToCreate)]
    #[case::suspend_ok(ClusterPhase::Suspending, ActionOutcome::Succeeded, ClusterPhase::Suspended)]
    #[case::scale_failed(ClusterPhase::Scaling, ActionOutcome::Failed, ClusterPhase::FailedToScale)]
    fn outcome_transitions(
        #[case] current: ClusterPhase,
        #[case] outcome: ActionOutcome,
        #[case] expected: ClusterPhase,
    ) {
        assert_eq!(next_phase(current, outcome).expect("transition must be legal"), expected);
    }

    #[rstest]
    #[case::steady(ClusterPhase::Healthy)]
    #[case::failure(ClusterPhase::FailedToScale)]
    fn outcome_needs_a_transient_phase(#[case] current: ClusterPhase) {
        let err = next_phase(current, ActionOutcome::Succeeded)
            .expect_err("non-transient phases have no outcome to apply");

        assert!(err.to_string().contains("not transient"));
    }

    #[test]
    fn concurrent_triggers_collapse_into_updating() {
        let none = BTreeSet::new();
        assert_eq!(combined_transient_phase(&none), None);

        let scale_only = BTreeSet::from([ClusterAction::Scale]);
        assert_eq!(combined_transient_phase(&scale_only), Some(ClusterPhase::Scaling));

        let scale_and_upgrade = BTreeSet::from([ClusterAction::Scale, ClusterAction::Upgrade]);
        assert_eq!(
            combined_transient_phase(&scale_and_upgrade),
            Some(ClusterPhase::Updating)
        );
    }

    #[test]
    fn phase_wire_names_are_stable() {
        let phase = serde_json::to_value(ClusterPhase::FailedToCreate).expect("phase must serialize");
        assert_eq!(phase, serde_json::json!("FailedToCreate"));

        let phase: ClusterPhase =
            serde_json::from_value(serde_json::json!("ManualMaintenance")).expect("phase must deserialize");
        assert_eq!(phase, ClusterPhase::ManualMaintenance);
    }
}
