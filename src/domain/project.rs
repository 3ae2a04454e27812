//! Project creation and dashboard payloads.

use serde::{Deserialize, Serialize};

use super::artifact::Value;

/// Fields collected when starting a new project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCreationRequest {
    pub project_name: String,
    pub client_name: String,
    pub project_description: String,
    pub project_type: String,
    pub budget_range: String,
    pub location: String,
    pub desired_features: Vec<String>,
}

/// Response to `POST /projects`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectCreated {
    #[serde(default)]
    pub message: String,
    pub project_id: String,
    #[serde(default = "null_value")]
    pub stage_1_results: Value,
    #[serde(default)]
    pub status_url: Option<String>,
}

fn null_value() -> Value {
    Value::Null
}

/// Response to `GET /projects`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<String>,
}

/// Response to `GET /projects/{id}/risks`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RiskSummary {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub risk_register: Vec<RiskEntry>,
}

/// One row of the risk register
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RiskEntry {
    #[serde(default, deserialize_with = "nullable_string")]
    pub risk_description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub risk_category: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub mitigation_strategy: String,
}

/// Response to `GET /projects/{id}/financials`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinancialSummary {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub total_estimated_cost_usd: Option<f64>,
    #[serde(default)]
    pub estimated_duration_weeks: Option<f64>,
    #[serde(default)]
    pub cost_breakdown: Option<Value>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub key_phases: Vec<Value>,
}

/// Response to `GET /projects/{id}/knowledge`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KnowledgeSummary {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub lessons_learned_summary: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub key_successes: Vec<Value>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub challenges_encountered: Vec<Value>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub actionable_lessons: Vec<Value>,
}

/// The dashboards pass `.get()` results through, so lists may be `null`
fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Generated register rows sometimes carry `null` for a text column
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
