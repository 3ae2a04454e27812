//! Decision gates and the stage-to-gate table.
//!
//! A gate is a human approval checkpoint bound to the completion of one stage.
//! Which stages are gate-controlled is client configuration: the table ships
//! with the build (or the config file) and is never fetched.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stage::{StageStatus, WorkflowStage};

/// Identifier of a decision gate ("G0" ... "G6")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateId(String);

impl GateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid gate id '{0}': expected 'G' followed by a number")]
pub struct InvalidGateId(pub String);

impl FromStr for GateId {
    type Err = InvalidGateId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix('G') {
            Some(n) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => {
                Ok(Self(s.to_string()))
            }
            _ => Err(InvalidGateId(s.to_string())),
        }
    }
}

impl PartialEq<str> for GateId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for GateId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Read-only lookup from stage id to the gate that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageGateMap {
    gates: BTreeMap<u32, GateId>,
}

impl Default for StageGateMap {
    /// The gate table bundled with the client
    fn default() -> Self {
        Self::new([
            (1, GateId::new("G0")),
            (4, GateId::new("G1")),
            (6, GateId::new("G2")),
            (8, GateId::new("G3")),
            (10, GateId::new("G4")),
            (12, GateId::new("G5")),
            (18, GateId::new("G6")),
        ])
    }
}

impl StageGateMap {
    /// Build a table from (stage id, gate id) pairs
    pub fn new(entries: impl IntoIterator<Item = (u32, GateId)>) -> Self {
        Self {
            gates: entries.into_iter().collect(),
        }
    }

    /// Gate bound to a stage, if the stage is gate-controlled
    pub fn gate_for(&self, stage_id: u32) -> Option<&GateId> {
        self.gates.get(&stage_id)
    }

    /// Stage a gate is bound to
    pub fn stage_for(&self, gate: &GateId) -> Option<u32> {
        self.gates
            .iter()
            .find(|(_, g)| *g == gate)
            .map(|(stage_id, _)| *stage_id)
    }

    /// Gate the user may approve from this stage.
    ///
    /// Only a `Pending` stage whose mapped gate equals the project's pending
    /// gate exposes an approval action.
    pub fn approval_gate<'a>(
        &'a self,
        stage: &WorkflowStage,
        pending_gate: Option<&GateId>,
    ) -> Option<&'a GateId> {
        if stage.status != StageStatus::Pending {
            return None;
        }
        let pending = pending_gate?;
        self.gate_for(stage.stage_id).filter(|gate| *gate == pending)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &GateId)> {
        self.gates.iter().map(|(stage_id, gate)| (*stage_id, gate))
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

/// Approval (or rejection) submitted for a pending gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateApprovalRequest {
    pub approved_by: String,
    pub comments: String,
    pub approved: bool,
}

impl GateApprovalRequest {
    /// An approval
    pub fn approve(approved_by: impl Into<String>, comments: impl Into<String>) -> Self {
        Self {
            approved_by: approved_by.into(),
            comments: comments.into(),
            approved: true,
        }
    }

    /// A rejection
    pub fn reject(approved_by: impl Into<String>, comments: impl Into<String>) -> Self {
        Self {
            approved: false,
            ..Self::approve(approved_by, comments)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(stage_id: u32, status: StageStatus) -> WorkflowStage {
        WorkflowStage {
            stage_id,
            name: format!("Stage {}", stage_id),
            status,
            artifacts: Vec::new(),
        }
    }

    #[test]
    fn test_default_table() {
        let map = StageGateMap::default();
        assert_eq!(map.len(), 7);
        assert_eq!(map.gate_for(1), Some(&GateId::new("G0")));
        assert_eq!(map.gate_for(12), Some(&GateId::new("G5")));
        assert_eq!(map.gate_for(18), Some(&GateId::new("G6")));
        assert_eq!(map.gate_for(2), None);
        assert_eq!(map.stage_for(&GateId::new("G3")), Some(8));
    }

    #[test]
    fn test_pending_stage_four_needs_g1() {
        let map = StageGateMap::default();
        let pending = stage(4, StageStatus::Pending);

        assert_eq!(
            map.approval_gate(&pending, Some(&GateId::new("G1"))),
            Some(&GateId::new("G1"))
        );
        assert_eq!(map.approval_gate(&pending, Some(&GateId::new("G0"))), None);
        assert_eq!(map.approval_gate(&pending, None), None);
    }

    #[test]
    fn test_non_pending_stages_never_expose_approval() {
        let map = StageGateMap::default();
        let gate = GateId::new("G1");

        for status in [StageStatus::Completed, StageStatus::Locked] {
            assert_eq!(map.approval_gate(&stage(4, status), Some(&gate)), None);
        }
    }

    #[test]
    fn test_gate_id_parsing() {
        assert_eq!("G4".parse::<GateId>().unwrap(), GateId::new("G4"));
        assert_eq!(" G10 ".parse::<GateId>().unwrap(), GateId::new("G10"));
        assert!("G".parse::<GateId>().is_err());
        assert!("gate1".parse::<GateId>().is_err());
        assert!("G1a".parse::<GateId>().is_err());
    }

    #[test]
    fn test_approval_request_serialization() {
        let json = serde_json::to_value(GateApprovalRequest::approve("user", "Looks good")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"approved_by": "user", "comments": "Looks good", "approved": true})
        );

        let rejection = GateApprovalRequest::reject("user", "Over budget");
        assert!(!rejection.approved);
    }
}
