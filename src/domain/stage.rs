//! Workflow stages and the project status snapshot.
//!
//! A `ProjectStatus` is rebuilt from scratch on every fetch; nothing here is
//! patched in place.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::artifact::Artifact;
use super::gate::{GateId, StageGateMap};

/// Status of a workflow stage as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StageStatus {
    /// Unlocked and waiting (possibly on a gate)
    Pending,

    /// Finished, artifacts available
    Completed,

    /// Behind an unapproved gate
    Locked,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Locked => "Locked",
        }
    }
}

/// One ordered unit of the project workflow
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowStage {
    pub stage_id: u32,
    pub name: String,
    pub status: StageStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Project status body as sent by `GET /projects/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectStatusWire {
    pub project_id: String,
    #[serde(default)]
    pub pending_gate: Option<GateId>,
    #[serde(default)]
    pub stages: Vec<WorkflowStage>,
}

/// Shape errors found while building a `ProjectStatus`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusShapeError {
    #[error("Duplicate stage_id {0} in project status")]
    DuplicateStage(u32),
}

/// Validated view of one project's workflow
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStatus {
    project_id: String,
    pending_gate: Option<GateId>,
    stages: Vec<WorkflowStage>,
}

impl ProjectStatus {
    /// Validate a wire body: stages are ordered by id, duplicates rejected
    pub fn from_wire(wire: ProjectStatusWire) -> Result<Self, StatusShapeError> {
        Self::new(wire.project_id, wire.pending_gate, wire.stages)
    }

    pub fn new(
        project_id: impl Into<String>,
        pending_gate: Option<GateId>,
        mut stages: Vec<WorkflowStage>,
    ) -> Result<Self, StatusShapeError> {
        let mut seen = HashSet::with_capacity(stages.len());
        for stage in &stages {
            if !seen.insert(stage.stage_id) {
                return Err(StatusShapeError::DuplicateStage(stage.stage_id));
            }
        }
        stages.sort_by_key(|s| s.stage_id);

        Ok(Self {
            project_id: project_id.into(),
            pending_gate,
            stages,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The single gate awaiting approval, if any
    pub fn pending_gate(&self) -> Option<&GateId> {
        self.pending_gate.as_ref()
    }

    /// Stages in ascending `stage_id` order
    pub fn stages(&self) -> &[WorkflowStage] {
        &self.stages
    }

    pub fn stage(&self, stage_id: u32) -> Option<&WorkflowStage> {
        self.stages
            .binary_search_by_key(&stage_id, |s| s.stage_id)
            .ok()
            .map(|idx| &self.stages[idx])
    }

    /// Whether the pending gate is bound to exactly one `Pending` stage.
    ///
    /// Vacuously true when no gate is pending.
    pub fn pending_gate_consistent(&self, gates: &StageGateMap) -> bool {
        let Some(pending) = &self.pending_gate else {
            return true;
        };
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Pending && gates.gate_for(s.stage_id) == Some(pending))
            .count()
            == 1
    }

    /// Log a warning when the backend reports a pending gate no pending
    /// stage is bound to. The snapshot is still usable.
    pub fn warn_if_inconsistent(&self, gates: &StageGateMap) {
        if !self.pending_gate_consistent(gates) {
            warn!(
                project_id = %self.project_id,
                pending_gate = ?self.pending_gate,
                "Pending gate is not bound to exactly one pending stage"
            );
        }
    }

    /// Number of completed stages
    pub fn completed_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Completed)
            .count()
    }
}
