//! Shared fixtures for integration tests.
//!
//! `FakeGateway` answers status and approval calls from queued scripts and
//! counts every call. A status reply can be held open until the test
//! releases it, which makes overlapping loads deterministic.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::oneshot;

use stagegate::adapters::{ApiGateway, GatewayError};
use stagegate::domain::{
    Artifact, FinancialSummary, GateApprovalRequest, GateId, KnowledgeSummary, ProjectCreated,
    ProjectCreationRequest, ProjectList, ProjectStatus, ProjectStatusWire, RiskSummary,
    StageGateMap,
};
use stagegate::WorkflowStateMachine;

pub type StatusResult = Result<ProjectStatus, GatewayError>;

enum StatusReply {
    Ready(StatusResult),
    Held(oneshot::Receiver<StatusResult>),
}

#[derive(Default)]
pub struct FakeGateway {
    statuses: Mutex<VecDeque<StatusReply>>,
    approvals: Mutex<VecDeque<Result<(), GatewayError>>>,
    submitted: Mutex<Vec<(String, GateId, GateApprovalRequest)>>,
    status_calls: AtomicUsize,
    approve_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue an immediate status reply
    pub fn push_status(&self, reply: StatusResult) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(StatusReply::Ready(reply));
    }

    /// Queue a status reply that completes when the returned sender fires
    pub fn hold_status(&self) -> oneshot::Sender<StatusResult> {
        let (tx, rx) = oneshot::channel();
        self.statuses
            .lock()
            .unwrap()
            .push_back(StatusReply::Held(rx));
        tx
    }

    pub fn push_approval(&self, reply: Result<(), GatewayError>) {
        self.approvals.lock().unwrap().push_back(reply);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn approve_calls(&self) -> usize {
        self.approve_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(String, GateId, GateApprovalRequest)> {
        self.submitted.lock().unwrap().clone()
    }
}

fn not_scripted() -> GatewayError {
    GatewayError::api(501, "not scripted")
}

#[async_trait]
impl ApiGateway for FakeGateway {
    async fn create_project(
        &self,
        _request: &ProjectCreationRequest,
    ) -> Result<ProjectCreated, GatewayError> {
        Err(not_scripted())
    }

    async fn get_status(&self, _project_id: &str) -> StatusResult {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.statuses.lock().unwrap().pop_front();
        match reply {
            Some(StatusReply::Ready(result)) => result,
            Some(StatusReply::Held(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Network("reply dropped".to_string()))),
            None => Err(not_scripted()),
        }
    }

    async fn get_artifact(
        &self,
        _project_id: &str,
        _stage_id: u32,
        _name: &str,
    ) -> Result<Artifact, GatewayError> {
        Err(not_scripted())
    }

    async fn get_risks(&self, _project_id: &str) -> Result<RiskSummary, GatewayError> {
        Err(not_scripted())
    }

    async fn get_financials(&self, _project_id: &str) -> Result<FinancialSummary, GatewayError> {
        Err(not_scripted())
    }

    async fn get_knowledge(&self, _project_id: &str) -> Result<KnowledgeSummary, GatewayError> {
        Err(not_scripted())
    }

    async fn approve_gate(
        &self,
        project_id: &str,
        gate_id: &GateId,
        request: &GateApprovalRequest,
    ) -> Result<(), GatewayError> {
        self.approve_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push((
            project_id.to_string(),
            gate_id.clone(),
            request.clone(),
        ));
        self.approvals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(not_scripted()))
    }

    async fn list_projects(&self) -> Result<ProjectList, GatewayError> {
        Err(not_scripted())
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Machine over a fake gateway with the default gate table
pub fn machine(gateway: &Arc<FakeGateway>) -> Arc<WorkflowStateMachine> {
    let gateway: Arc<dyn ApiGateway> = gateway.clone();
    Arc::new(WorkflowStateMachine::new(
        gateway,
        Arc::new(StageGateMap::default()),
    ))
}

/// Parse a status body the way the backend sends it
pub fn status_from_json(body: serde_json::Value) -> ProjectStatus {
    let wire: ProjectStatusWire = serde_json::from_value(body).unwrap();
    ProjectStatus::from_wire(wire).unwrap()
}

/// Fresh project: stage 1 pending on G0, the rest locked
pub fn awaiting_charter(project_id: &str) -> ProjectStatus {
    status_from_json(json!({
        "project_id": project_id,
        "pending_gate": "G0",
        "stages": [
            {
                "stage_id": 1,
                "name": "Project Initiation & Feasibility",
                "status": "Pending",
                "artifacts": [
                    {"name": "project_charter.json", "type": "json", "content": {"project_name": "Eco House"}}
                ]
            },
            {"stage_id": 2, "name": "Site Analysis", "status": "Locked", "artifacts": []},
            {"stage_id": 3, "name": "Conceptual Design", "status": "Locked", "artifacts": []}
        ]
    }))
}

/// Same project after G0: stages 1-3 completed, stage 4 pending on G1
pub fn awaiting_design_review(project_id: &str) -> ProjectStatus {
    status_from_json(json!({
        "project_id": project_id,
        "pending_gate": "G1",
        "stages": [
            {
                "stage_id": 1,
                "name": "Project Initiation & Feasibility",
                "status": "Completed",
                "artifacts": [
                    {"name": "project_charter.json", "type": "json", "content": {"project_name": "Eco House"}}
                ]
            },
            {
                "stage_id": 2,
                "name": "Site Analysis",
                "status": "Completed",
                "artifacts": [
                    {"name": "site_report.json", "type": "json", "content": {"soil": "clay"}}
                ]
            },
            {
                "stage_id": 3,
                "name": "Conceptual Design",
                "status": "Completed",
                "artifacts": [
                    {"name": "design_brief.json", "type": "json", "content": {"style": "modern"}},
                    {"name": "mood_board.txt", "type": "text", "content": "timber, glass"}
                ]
            },
            {"stage_id": 4, "name": "Preliminary Design", "status": "Pending", "artifacts": []}
        ]
    }))
}
