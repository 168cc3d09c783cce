// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Trigger a GitHub Actions deployment from a Port action.
//!
//! The handler receives an HTTP-style invocation whose `body` carries the
//! Port run context. It locates the configured workflow in the target
//! repository, fires a `workflow_dispatch` event on the configured branch
//! and marks the Port action run as successful whatever GitHub answered
//! to the dispatch itself.
//!
//! ```no_run
//! use port_client::{PortClient, PortConfig};
//! use port_deployment_trigger::{DeploymentConfig, GitHubClient, HttpInvocation, handle_invocation};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let port = PortClient::new(PortConfig::from_env()?)?;
//! let config = DeploymentConfig::from_env()?;
//! let github = GitHubClient::new(&config)?;
//!
//! let invocation = HttpInvocation::new(r#"{"context":{"runId":"r_1"}}"#);
//! let response = handle_invocation(&port, &github, &config, &invocation).await?;
//! assert_eq!(response.status_code, 200);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod github;

pub use config::{
    DEFAULT_BRANCH, DEFAULT_GITHUB_API_URL, DEFAULT_ORG, DEFAULT_REPO, DEFAULT_WORKFLOW,
    DeploymentConfig,
};
pub use error::{Result, TriggerError};
pub use github::{Branch, GitHubClient, Repository, Workflow};

use port_client::{HandlerResponse, PortClient, RunContext, RunStatus, RunStatusUpdate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

/// Message reported on the Port action run once the workflow is dispatched.
pub const TRIGGERED_RUN_MESSAGE: &str = "The deploy workflow has been triggered";

/// Message returned to the caller.
pub const TRIGGERED_RESPONSE_MESSAGE: &str = "Workflow triggered";

/// HTTP-style Lambda event. Only the raw body is used.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpInvocation {
    #[serde(default)]
    pub body: Option<String>,
}

impl HttpInvocation {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    /// Parse the JSON body into a deployment request.
    pub fn request(&self) -> Result<DeploymentRequest> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| TriggerError::InvalidRequest("missing body".to_string()))?;
        Ok(serde_json::from_str(body)?)
    }
}

/// Body of the invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentRequest {
    pub context: RunContext,
}

/// HTTP-style response returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResponse {
    pub status_code: u16,
    pub body: HandlerResponse,
}

impl DeploymentResponse {
    pub fn triggered() -> Self {
        Self {
            status_code: 200,
            body: HandlerResponse::new(TRIGGERED_RESPONSE_MESSAGE),
        }
    }
}

/// Dispatch the deployment workflow and report the Port action run.
#[instrument(skip_all, fields(repository = %config.repository(), workflow = %config.workflow))]
pub async fn handle_invocation(
    port: &PortClient,
    github: &GitHubClient,
    config: &DeploymentConfig,
    invocation: &HttpInvocation,
) -> Result<DeploymentResponse> {
    let request = invocation.request()?;
    let run_id = request.context.run_id.as_str();
    info!(run_id, "Deployment requested");

    let repository = github.get_repository(&config.org, &config.repo).await?;
    let branch = github.get_branch(&repository, &config.branch).await?;
    let workflow = github.find_workflow(&repository, &config.workflow).await?;

    let dispatch_code = github
        .dispatch_workflow(&repository, &workflow, &branch, &json!({}))
        .await?;
    info!(dispatch_code, workflow_id = workflow.id, "Workflow dispatch sent");

    let update = RunStatusUpdate::new(RunStatus::Success, TRIGGERED_RUN_MESSAGE);
    let report_code = port.report_run_status(run_id, &update).await?;
    info!(run_id, report_code, "Reported action run status");

    Ok(DeploymentResponse::triggered())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_parsing() {
        let invocation = HttpInvocation::new(r#"{"context":{"runId":"r_42"},"payload":{}}"#);
        let request = invocation.request().unwrap();
        assert_eq!(request.context.run_id, "r_42");
    }

    #[test]
    fn test_invalid_bodies() {
        let err = HttpInvocation::new("not json").request().unwrap_err();
        assert!(matches!(err, TriggerError::InvalidRequest(_)));

        let err = HttpInvocation::new(r#"{"context":{}}"#).request().unwrap_err();
        assert!(matches!(err, TriggerError::InvalidRequest(_)));

        let event: HttpInvocation = serde_json::from_value(json!({"headers": {}})).unwrap();
        let err = event.request().unwrap_err();
        assert!(err.to_string().contains("missing body"));
    }

    #[test]
    fn test_response_shape() {
        let value = serde_json::to_value(DeploymentResponse::triggered()).unwrap();
        assert_eq!(
            value,
            json!({"statusCode": 200, "body": {"message": "Workflow triggered"}})
        );
    }
}
