//! Adapter interfaces for the workflow backend.
//!
//! The rest of the crate only sees the narrow [`ApiGateway`] contract; the
//! HTTP implementation lives in [`http`].

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    Artifact, FinancialSummary, GateApprovalRequest, GateId, KnowledgeSummary, ProjectCreated,
    ProjectCreationRequest, ProjectList, ProjectStatus, RiskSummary,
};

// Re-export the HTTP adapter
pub use http::HttpGateway;

/// Failures reported by an [`ApiGateway`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Transport failure, no response received
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status code
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A response arrived but its payload was malformed
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }
}

/// Contract the workflow core depends on
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Create a project; the backend runs stage 1 before answering
    async fn create_project(
        &self,
        request: &ProjectCreationRequest,
    ) -> Result<ProjectCreated, GatewayError>;

    /// Fetch the authoritative status of a project
    async fn get_status(&self, project_id: &str) -> Result<ProjectStatus, GatewayError>;

    /// Fetch a single artifact file of a stage
    async fn get_artifact(
        &self,
        project_id: &str,
        stage_id: u32,
        name: &str,
    ) -> Result<Artifact, GatewayError>;

    async fn get_risks(&self, project_id: &str) -> Result<RiskSummary, GatewayError>;

    async fn get_financials(&self, project_id: &str) -> Result<FinancialSummary, GatewayError>;

    async fn get_knowledge(&self, project_id: &str) -> Result<KnowledgeSummary, GatewayError>;

    /// Record an approval or rejection for a gate
    async fn approve_gate(
        &self,
        project_id: &str,
        gate_id: &GateId,
        request: &GateApprovalRequest,
    ) -> Result<(), GatewayError>;

    async fn list_projects(&self) -> Result<ProjectList, GatewayError>;

    /// Health check against the service root
    async fn health_check(&self) -> Result<(), GatewayError>;
}
