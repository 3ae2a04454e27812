//! Domain types for the stagegate client.
//!
//! This module contains the core data structures:
//! - Artifact: Stage deliverables and their open-tagged payloads
//! - Stage: Workflow stages and the project status snapshot
//! - Gate: Decision gates and the stage-to-gate table
//! - Project: Creation and dashboard payloads

pub mod artifact;
pub mod gate;
pub mod project;
pub mod stage;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactContent, Fields, Value};
pub use gate::{GateApprovalRequest, GateId, InvalidGateId, StageGateMap};
pub use project::{
    FinancialSummary, KnowledgeSummary, ProjectCreated, ProjectCreationRequest, ProjectList,
    RiskEntry, RiskSummary,
};
pub use stage::{ProjectStatus, ProjectStatusWire, StageStatus, StatusShapeError, WorkflowStage};
