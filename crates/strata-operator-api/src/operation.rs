//! Tracking of long-running operations on a cluster.
//!
//! An [`Operation`] records one long-running action (creation, scaling, a
//! version update, ...) and its ordered [`OperationStep`]s. Records are
//! created and mutated exclusively by the control loop and retained after
//! completion for audit, until a new operation of the same kind supersedes
//! them. All timestamps are supplied by the caller; this module never reads
//! a clock.

use std::collections::BTreeSet;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, Snafu, ensure};

use crate::lifecycle::ActionOutcome;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("operation {id} does not exist"))]
    UnknownOperation { id: u64 },

    #[snafu(display("operation {id} is terminated and immutable"))]
    Terminated { id: u64 },

    #[snafu(display("operation {parent} is itself a sub-operation, nesting is limited to one level"))]
    NestedSubOperation { parent: u64 },
}

/// The kind of work an operation tracks. Serialized kind names are part of
/// the wire contract.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum OperationKind {
    Creation,
    HorizontalScaling,
    VersionUpdate,
    Backup,
    Restore,
    Resync,
    Recovery,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum OperationPhase {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize, strum::Display,
)]
pub enum StepPhase {
    InProgress,
    Completed,
    Failed,
}

/// An ordered sub-unit of an [`Operation`], looked up by name. The step set
/// is append-only during the operation's lifetime.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStep {
    /// Name of the step, unique within its operation.
    pub name: String,

    /// Position of the step within its operation, starting at 1.
    pub id: u64,

    pub phase: StepPhase,

    /// Free-text message, usually the failure cause.
    pub message: Option<String>,
}

/// One long-running action on a cluster.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Identifier of the operation, monotonically increasing per resource.
    pub id: u64,

    pub kind: OperationKind,

    pub phase: OperationPhase,

    /// When the operation was started.
    pub started_at: Option<Time>,

    /// When the operation reached a terminal phase.
    pub completed_at: Option<Time>,

    /// Free-text progress or failure message.
    pub message: Option<String>,

    /// Id of the parent operation, if this is a sub-operation.
    pub sub_operation_of: Option<u64>,

    #[serde(default)]
    pub steps: Vec<OperationStep>,
}

impl Operation {
    /// Whether the operation reached a terminal phase and became immutable.
    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, OperationPhase::Completed | OperationPhase::Failed)
    }

    /// Whether any step failed. A failed step implies the operation
    /// eventually terminates as [`OperationPhase::Failed`]; the control loop
    /// decides the final cutover when calling [`OperationLog::complete`].
    pub fn has_failed_steps(&self) -> bool {
        self.steps.iter().any(|step| step.phase == StepPhase::Failed)
    }

    /// Looks up a step by name.
    pub fn step(&self, name: &str) -> Option<&OperationStep> {
        self.steps.iter().find(|step| step.name == name)
    }
}

/// The per-resource log of long-running operations, persisted in the cluster
/// status.
///
/// The id counter is persisted next to the records so ids stay monotonic
/// even after superseded records have been dropped from the log.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    #[serde(default)]
    next_id: u64,

    #[serde(default)]
    entries: Vec<Operation>,
}

impl OperationLog {
    /// Starts tracking a new operation and returns its id.
    ///
    /// Terminated operations of the same kind, together with their
    /// sub-operations, are superseded and dropped from the log.
    pub fn start(&mut self, kind: OperationKind, now: Time) -> u64 {
        self.supersede(kind);
        self.push(kind, None, now)
    }

    /// Starts tracking a sub-operation of `parent`.
    ///
    /// Fails if the parent does not exist, is already terminated or is
    /// itself a sub-operation; only one level of nesting is supported.
    pub fn start_sub(&mut self, kind: OperationKind, parent: u64, now: Time) -> Result<u64> {
        let parent_operation = self
            .get(parent)
            .context(UnknownOperationSnafu { id: parent })?;

        ensure!(!parent_operation.is_terminated(), TerminatedSnafu { id: parent });
        ensure!(
            parent_operation.sub_operation_of.is_none(),
            NestedSubOperationSnafu { parent }
        );

        Ok(self.push(kind, Some(parent), now))
    }

    /// Appends or updates a step of a running operation.
    ///
    /// Steps are looked up by name. Re-recording a step in its current phase
    /// is a no-op, so callers can report progress idempotently. The step set
    /// is append-only, a step is never removed.
    pub fn record_step(
        &mut self,
        id: u64,
        name: &str,
        phase: StepPhase,
        message: Option<String>,
    ) -> Result<()> {
        let operation = self.get_mut(id)?;
        ensure!(!operation.is_terminated(), TerminatedSnafu { id });

        match operation.steps.iter_mut().find(|step| step.name == name) {
            Some(step) if step.phase == phase => {}
            Some(step) => {
                step.phase = phase;
                step.message = message;
            }
            None => {
                let step_id = operation.steps.len() as u64 + 1;
                operation.steps.push(OperationStep {
                    name: name.to_owned(),
                    id: step_id,
                    phase,
                    message,
                });
            }
        }

        Ok(())
    }

    /// Terminates a running operation with the given outcome.
    ///
    /// A terminated operation is immutable; completing it a second time is
    /// an error.
    pub fn complete(
        &mut self,
        id: u64,
        outcome: ActionOutcome,
        message: Option<String>,
        now: Time,
    ) -> Result<()> {
        let operation = self.get_mut(id)?;
        ensure!(!operation.is_terminated(), TerminatedSnafu { id });

        operation.phase = match outcome {
            ActionOutcome::Succeeded => OperationPhase::Completed,
            ActionOutcome::Failed => OperationPhase::Failed,
        };
        operation.completed_at = Some(now);
        if message.is_some() {
            operation.message = message;
        }

        Ok(())
    }

    /// Looks up an operation by id.
    pub fn get(&self, id: u64) -> Option<&Operation> {
        self.entries.iter().find(|operation| operation.id == id)
    }

    /// All tracked operations, running and retained.
    pub fn entries(&self) -> &[Operation] {
        &self.entries
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Operation> {
        self.entries
            .iter_mut()
            .find(|operation| operation.id == id)
            .context(UnknownOperationSnafu { id })
    }

    fn push(&mut self, kind: OperationKind, parent: Option<u64>, now: Time) -> u64 {
        self.next_id += 1;
        let id = self.next_id;

        self.entries.push(Operation {
            id,
            kind,
            phase: OperationPhase::InProgress,
            started_at: Some(now),
            completed_at: None,
            message: None,
            sub_operation_of: parent,
            steps: Vec::new(),
        });

        id
    }

    fn supersede(&mut self, kind: OperationKind) {
        let superseded: BTreeSet<u64> = self
            .entries
            .iter()
            .filter(|operation| {
                operation.kind == kind
                    && operation.is_terminated()
                    && operation.sub_operation_of.is_none()
            })
            .map(|operation| operation.id)
            .collect();

        self.entries.retain(|operation| {
            !superseded.contains(&operation.id)
                && operation
                    .sub_operation_of
                    .is_none_or(|parent| !superseded.contains(&parent))
        });
    }
}
