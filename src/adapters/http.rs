//! HTTP adapter for the workflow backend's REST API.
//!
//! Every call maps transport failures to [`GatewayError::Network`], any
//! unexpected status to [`GatewayError::Api`] (status code plus raw body), and
//! unparseable bodies to [`GatewayError::Decode`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{ApiGateway, GatewayError};
use crate::config::ApiSettings;
use crate::domain::{
    Artifact, ArtifactContent, FinancialSummary, GateApprovalRequest, GateId, KnowledgeSummary,
    ProjectCreated, ProjectCreationRequest, ProjectList, ProjectStatus, ProjectStatusWire,
    RiskSummary,
};

/// REST client for the workflow backend
#[derive(Clone)]
pub struct HttpGateway {
    /// Service root, e.g. `http://127.0.0.1:8000/`
    base_url: Url,
    /// HTTP client
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a gateway for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot be used as a base: {}", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, client })
    }

    /// Create from resolved settings
    pub fn from_settings(settings: &ApiSettings) -> Result<Self> {
        Self::new(&settings.base_url, Duration::from_secs(settings.timeout_seconds))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL; segments are percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
        let url = self.endpoint(segments);
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(network)?;
        let body = read_body(response, StatusCode::OK).await?;
        decode(&body)
    }
}

fn network(err: reqwest::Error) -> GatewayError {
    GatewayError::Network(err.to_string())
}

/// Read the body, failing with the status and body when the status is not
/// the one the endpoint answers with on success
async fn read_body(response: Response, expected: StatusCode) -> Result<String, GatewayError> {
    let status = response.status();
    let body = response.text().await.map_err(network)?;
    if status != expected {
        return Err(GatewayError::api(status.as_u16(), body));
    }
    Ok(body)
}

/// Build an artifact from a single-file response.
///
/// `.json` files come back as `{type, content}` documents; every other file
/// is served raw. Images are re-encoded as base64 so they render like inline
/// image artifacts, anything else becomes a text artifact.
fn fetched_artifact(
    name: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Artifact, GatewayError> {
    let media = content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim());

    match media {
        Some(m) if m.starts_with("image/") => Ok(Artifact::new(
            name,
            "image_base64",
            ArtifactContent::Scalar(STANDARD.encode(body)),
        )),
        Some(m) if m == "application/json" || m.ends_with("+json") => {
            let document: serde_json::Value =
                serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
            if !document.is_object() {
                return Err(GatewayError::Decode(format!(
                    "Expected a JSON object for artifact '{}'",
                    name
                )));
            }
            Ok(Artifact::from_fetched(name, document))
        }
        Some(_) => Ok(text_artifact(name, body)),
        // No declared type: accept a JSON document, otherwise keep it as text
        None => match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(document) if document.is_object() => Ok(Artifact::from_fetched(name, document)),
            _ => Ok(text_artifact(name, body)),
        },
    }
}

fn text_artifact(name: &str, body: &[u8]) -> Artifact {
    Artifact::new(
        name,
        "text",
        ArtifactContent::Scalar(String::from_utf8_lossy(body).into_owned()),
    )
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl ApiGateway for HttpGateway {
    #[instrument(skip(self, request), fields(project_name = %request.project_name))]
    async fn create_project(
        &self,
        request: &ProjectCreationRequest,
    ) -> Result<ProjectCreated, GatewayError> {
        let response = self
            .client
            .post(self.endpoint(&["projects"]))
            .json(request)
            .send()
            .await
            .map_err(network)?;
        let body = read_body(response, StatusCode::CREATED).await?;
        decode(&body)
    }

    #[instrument(skip(self))]
    async fn get_status(&self, project_id: &str) -> Result<ProjectStatus, GatewayError> {
        let wire: ProjectStatusWire = self.get_json(&["projects", project_id]).await?;
        ProjectStatus::from_wire(wire).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn get_artifact(
        &self,
        project_id: &str,
        stage_id: u32,
        name: &str,
    ) -> Result<Artifact, GatewayError> {
        let stage = stage_id.to_string();
        let url = self.endpoint(&["projects", project_id, "artifacts", &stage, name]);
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        let body = response.bytes().await.map_err(network)?;
        if status != StatusCode::OK {
            return Err(GatewayError::api(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        fetched_artifact(name, content_type.as_deref(), &body)
    }

    #[instrument(skip(self))]
    async fn get_risks(&self, project_id: &str) -> Result<RiskSummary, GatewayError> {
        self.get_json(&["projects", project_id, "risks"]).await
    }

    #[instrument(skip(self))]
    async fn get_financials(&self, project_id: &str) -> Result<FinancialSummary, GatewayError> {
        self.get_json(&["projects", project_id, "financials"]).await
    }

    #[instrument(skip(self))]
    async fn get_knowledge(&self, project_id: &str) -> Result<KnowledgeSummary, GatewayError> {
        self.get_json(&["projects", project_id, "knowledge"]).await
    }

    #[instrument(skip(self, request), fields(gate = %gate_id, approved = request.approved))]
    async fn approve_gate(
        &self,
        project_id: &str,
        gate_id: &GateId,
        request: &GateApprovalRequest,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.endpoint(&["projects", project_id, "approve", gate_id.as_str()]))
            .json(request)
            .send()
            .await
            .map_err(network)?;
        read_body(response, StatusCode::OK).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<ProjectList, GatewayError> {
        self.get_json(&["projects"]).await
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), GatewayError> {
        let response = self
            .client
            .get(self.endpoint(&[]))
            .send()
            .await
            .map_err(network)?;
        read_body(response, StatusCode::OK).await?;
        Ok(())
    }
}
