//! Gate approval coordination.
//!
//! Approving a gate is one user-visible operation made of two backend calls:
//! submit the approval, then reload the project so the advanced stage shows.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::adapters::GatewayError;
use crate::domain::{GateApprovalRequest, GateId};

use super::workflow::{WorkflowState, WorkflowStateMachine};

/// Approval failures. None of them change the workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// The machine does not hold a loaded snapshot of this project
    #[error("Project {project_id} is not loaded; load it before approving")]
    NotLoaded { project_id: String },

    /// The gate is not the one the last snapshot reports as pending
    #[error("Gate {requested} is not the pending gate (pending: {})", pending_label(.pending))]
    GateMismatch {
        requested: GateId,
        pending: Option<GateId>,
    },

    /// The backend rejected or never received the approval
    #[error("Approval submission failed: {0}")]
    Submission(#[from] GatewayError),
}

fn pending_label(pending: &Option<GateId>) -> &str {
    pending.as_ref().map(GateId::as_str).unwrap_or("none")
}

/// Sequences approval submission and the follow-up reload
#[derive(Clone)]
pub struct GateApprovalCoordinator {
    machine: Arc<WorkflowStateMachine>,
}

impl GateApprovalCoordinator {
    pub fn new(machine: Arc<WorkflowStateMachine>) -> Self {
        Self { machine }
    }

    pub fn machine(&self) -> &Arc<WorkflowStateMachine> {
        &self.machine
    }

    /// Submit an approval for the project's pending gate.
    ///
    /// `gate_id` must be the gate reported as pending by the current
    /// `Loaded` state. On success exactly one reload is issued; a failed
    /// reload surfaces through the machine's `Error` state, not here.
    #[instrument(skip(self, request), fields(approved = request.approved))]
    pub async fn approve(
        &self,
        project_id: &str,
        gate_id: &GateId,
        request: &GateApprovalRequest,
    ) -> Result<(), ApprovalError> {
        let status = match self.machine.current() {
            WorkflowState::Loaded(status) if status.project_id() == project_id => status,
            _ => {
                return Err(ApprovalError::NotLoaded {
                    project_id: project_id.to_string(),
                })
            }
        };

        if status.pending_gate() != Some(gate_id) {
            return Err(ApprovalError::GateMismatch {
                requested: gate_id.clone(),
                pending: status.pending_gate().cloned(),
            });
        }

        if let Err(e) = self
            .machine
            .gateway()
            .approve_gate(project_id, gate_id, request)
            .await
        {
            warn!(error = %e, "Gate approval rejected");
            return Err(e.into());
        }

        info!("Gate approval recorded, reloading project");
        self.machine.request_load(project_id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let mismatch = ApprovalError::GateMismatch {
            requested: GateId::new("G2"),
            pending: Some(GateId::new("G1")),
        };
        assert_eq!(
            mismatch.to_string(),
            "Gate G2 is not the pending gate (pending: G1)"
        );

        let none = ApprovalError::GateMismatch {
            requested: GateId::new("G0"),
            pending: None,
        };
        assert_eq!(none.to_string(), "Gate G0 is not the pending gate (pending: none)");

        let submission = ApprovalError::from(GatewayError::api(404, "Gate G9 not found."));
        assert_eq!(
            submission.to_string(),
            "Approval submission failed: API error (404): Gate G9 not found."
        );
    }
}
