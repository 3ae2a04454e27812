//! Core client logic.
//!
//! This module contains:
//! - Workflow: State machine mirroring a project's workflow
//! - Approval: Gate approval coordination
//! - Render: Artifact type dispatch
//! - View: Per-stage approval eligibility

pub mod approval;
pub mod render;
pub mod view;
pub mod workflow;

// Re-export commonly used types
pub use approval::{ApprovalError, GateApprovalCoordinator};
pub use render::{classify, render, render_stage, RenderDescriptor, Strategy, TreeNode};
pub use view::{approvable_stage, project_view, StageView};
pub use workflow::{LoadOutcome, WorkflowEvent, WorkflowState, WorkflowStateMachine};
