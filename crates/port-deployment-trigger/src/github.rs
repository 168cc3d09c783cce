// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Minimal GitHub Actions client: repository, branch and workflow lookup, workflow dispatch.
//!
//! Lookups fail on any non-2xx answer. The dispatch call only reports the
//! status it got back.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::DeploymentConfig;
use crate::error::{Result, TriggerError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const WORKFLOWS_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub commit: Option<BranchCommit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowPage {
    total_count: usize,
    workflows: Vec<Workflow>,
}

#[derive(Debug, Serialize)]
struct DispatchBody<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    inputs: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

/// GitHub REST client authenticated with a machine user token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    pub fn new(config: &DeploymentConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.github_token))
            .map_err(|e| TriggerError::Config(format!("invalid GITHUB_MACHINE_TOKEN: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| TriggerError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.github_api_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(TriggerError::GitHub {
            status: status.as_u16(),
            message: error_message(response).await,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.http.get(self.url(path))).await?;
        Ok(response.json().await?)
    }

    /// Look up a repository.
    #[instrument(skip(self))]
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        debug!("Getting repository");
        self.get_json(&format!("/repos/{}/{}", owner, repo)).await
    }

    /// Look up a branch of a repository.
    #[instrument(skip(self, repository), fields(repository = %repository.full_name))]
    pub async fn get_branch(&self, repository: &Repository, branch: &str) -> Result<Branch> {
        debug!("Getting branch");
        self.get_json(&format!(
            "/repos/{}/branches/{}",
            repository.full_name, branch
        ))
        .await
    }

    /// List every workflow of a repository, following pagination.
    #[instrument(skip(self, repository), fields(repository = %repository.full_name))]
    pub async fn list_workflows(&self, repository: &Repository) -> Result<Vec<Workflow>> {
        let mut workflows = Vec::new();
        let mut page = 1;

        loop {
            let path = format!(
                "/repos/{}/actions/workflows?per_page={}&page={}",
                repository.full_name, WORKFLOWS_PER_PAGE, page
            );
            let batch: WorkflowPage = self.get_json(&path).await?;
            let received = batch.workflows.len();
            workflows.extend(batch.workflows);

            if received < WORKFLOWS_PER_PAGE || workflows.len() >= batch.total_count {
                break;
            }
            page += 1;
        }

        debug!(count = workflows.len(), "Listed workflows");
        Ok(workflows)
    }

    /// First workflow whose name matches exactly.
    pub async fn find_workflow(&self, repository: &Repository, name: &str) -> Result<Workflow> {
        let workflows = self.list_workflows(repository).await?;
        for workflow in workflows {
            debug!(name = %workflow.name, id = workflow.id, "Inspecting workflow");
            if workflow.name == name {
                info!(id = workflow.id, path = %workflow.path, "Found workflow");
                return Ok(workflow);
            }
        }

        Err(TriggerError::WorkflowNotFound {
            workflow: name.to_string(),
            repository: repository.full_name.clone(),
        })
    }

    /// Fire a `workflow_dispatch` event and return the HTTP status (204 when accepted).
    ///
    /// A rejected dispatch is logged, not returned as an error.
    #[instrument(skip(self, repository, workflow, inputs), fields(repository = %repository.full_name, workflow_id = workflow.id, branch = %branch.name))]
    pub async fn dispatch_workflow(
        &self,
        repository: &Repository,
        workflow: &Workflow,
        branch: &Branch,
        inputs: &Value,
    ) -> Result<u16> {
        let path = format!(
            "/repos/{}/actions/workflows/{}/dispatches",
            repository.full_name, workflow.id
        );
        let body = DispatchBody {
            git_ref: &branch.name,
            inputs,
        };

        let response = self.http.post(self.url(&path)).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            warn!(
                status = status.as_u16(),
                reason = %message,
                "Workflow dispatch was not accepted"
            );
        }
        Ok(status.as_u16())
    }
}

/// GitHub's `message` field, or the raw body when it has none.
async fn error_message(response: Response) -> String {
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to read GitHub response body");
            return String::new();
        }
    };
    serde_json::from_str::<GitHubErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or(text)
}
