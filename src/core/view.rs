//! Per-stage view of a project snapshot.

use crate::domain::{GateId, ProjectStatus, StageGateMap, StageStatus};

/// What a presentation layer needs to draw one stage row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub stage_id: u32,
    pub name: String,
    pub status: StageStatus,
    /// Gate the user can approve from this stage, if any
    pub approval_gate: Option<GateId>,
    pub artifact_count: usize,
}

/// Build stage rows in display order
pub fn project_view(status: &ProjectStatus, gates: &StageGateMap) -> Vec<StageView> {
    status
        .stages()
        .iter()
        .map(|stage| StageView {
            stage_id: stage.stage_id,
            name: stage.name.clone(),
            status: stage.status,
            approval_gate: gates.approval_gate(stage, status.pending_gate()).cloned(),
            artifact_count: stage.artifacts.len(),
        })
        .collect()
}

/// The stage whose approval action is currently exposed, if any
pub fn approvable_stage(status: &ProjectStatus, gates: &StageGateMap) -> Option<StageView> {
    project_view(status, gates)
        .into_iter()
        .find(|view| view.approval_gate.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Artifact, ArtifactContent, WorkflowStage};

    fn stage(stage_id: u32, status: StageStatus, artifacts: usize) -> WorkflowStage {
        WorkflowStage {
            stage_id,
            name: format!("Stage {}", stage_id),
            status,
            artifacts: (0..artifacts)
                .map(|i| Artifact::new(format!("a{}.json", i), "json", ArtifactContent::Absent))
                .collect(),
        }
    }

    #[test]
    fn test_only_pending_gated_stage_is_approvable() {
        let status = ProjectStatus::new(
            "p1",
            Some(GateId::new("G1")),
            vec![
                stage(1, StageStatus::Completed, 2),
                stage(2, StageStatus::Completed, 1),
                stage(3, StageStatus::Completed, 1),
                stage(4, StageStatus::Pending, 0),
                stage(5, StageStatus::Locked, 0),
            ],
        )
        .unwrap();

        let views = project_view(&status, &StageGateMap::default());
        let gated: Vec<u32> = views
            .iter()
            .filter(|v| v.approval_gate.is_some())
            .map(|v| v.stage_id)
            .collect();
        assert_eq!(gated, vec![4]);
        assert_eq!(views[0].artifact_count, 2);

        let approvable = approvable_stage(&status, &StageGateMap::default()).unwrap();
        assert_eq!(approvable.approval_gate, Some(GateId::new("G1")));
    }

    #[test]
    fn test_swapped_gate_table() {
        let status = ProjectStatus::new(
            "p1",
            Some(GateId::new("G1")),
            vec![stage(4, StageStatus::Pending, 0), stage(5, StageStatus::Pending, 0)],
        )
        .unwrap();
        let gates = StageGateMap::new([(5, GateId::new("G1"))]);

        let approvable = approvable_stage(&status, &gates).unwrap();
        assert_eq!(approvable.stage_id, 5);
    }

    #[test]
    fn test_no_pending_gate_no_actions() {
        let status =
            ProjectStatus::new("p1", None, vec![stage(1, StageStatus::Pending, 0)]).unwrap();
        assert!(approvable_stage(&status, &StageGateMap::default()).is_none());
    }
}
