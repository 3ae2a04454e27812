//! stagegate - client for gated construction project workflows
//!
//! A Rust client for a backend that runs construction projects through a
//! fixed sequence of stages, pausing at decision gates until a human
//! approves them.
//!
//! # Architecture
//!
//! The client never computes workflow progress itself:
//! - Every view is a fresh snapshot fetched from the backend
//! - Overlapping loads resolve last-request-wins
//! - Approving a gate submits the decision, then reloads the project
//! - Artifacts are dispatched on an open set of type tags
//!
//! # Modules
//!
//! - `adapters`: Backend integration (ApiGateway, HttpGateway)
//! - `core`: Client logic (WorkflowStateMachine, GateApprovalCoordinator, render)
//! - `domain`: Data structures (ProjectStatus, Artifact, StageGateMap)
//! - `config`: Configuration loading
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Show the stage table of a project
//! stagegate status <project-id>
//!
//! # Approve its pending gate
//! stagegate approve <project-id> G0
//!
//! # Render the artifacts of one stage
//! stagegate show <project-id> --stage 6 --save-images ./renders
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{ApiGateway, GatewayError, HttpGateway};
pub use core::{
    render, ApprovalError, GateApprovalCoordinator, RenderDescriptor, WorkflowState,
    WorkflowStateMachine,
};
pub use domain::{Artifact, ArtifactContent, GateId, ProjectStatus, StageGateMap, StageStatus};
