// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the deployment trigger.

use std::env;
use std::fmt;

use crate::error::{Result, TriggerError};

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
/// Default organization owning the target repository.
pub const DEFAULT_ORG: &str = "port-labs";
/// Default target repository.
pub const DEFAULT_REPO: &str = "resource-catalog-microservice-repo";
/// Default workflow name to dispatch.
pub const DEFAULT_WORKFLOW: &str = "Deploy Recommendation Prod";
/// Default branch the workflow runs on.
pub const DEFAULT_BRANCH: &str = "main";

/// Where and what to deploy.
#[derive(Clone)]
pub struct DeploymentConfig {
    /// Machine user token for the GitHub API.
    pub github_token: String,
    /// GitHub REST API base URL, without trailing slash.
    pub github_api_url: String,
    pub org: String,
    pub repo: String,
    /// Workflow display name, matched exactly.
    pub workflow: String,
    pub branch: String,
}

impl fmt::Debug for DeploymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentConfig")
            .field("github_token", &"<redacted>")
            .field("github_api_url", &self.github_api_url)
            .field("org", &self.org)
            .field("repo", &self.repo)
            .field("workflow", &self.workflow)
            .field("branch", &self.branch)
            .finish()
    }
}

impl DeploymentConfig {
    /// Create a configuration targeting the default repository and workflow.
    pub fn new(github_token: impl Into<String>) -> Self {
        Self {
            github_token: github_token.into(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            org: DEFAULT_ORG.to_string(),
            repo: DEFAULT_REPO.to_string(),
            workflow: DEFAULT_WORKFLOW.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Required:
    /// - `GITHUB_MACHINE_TOKEN`
    ///
    /// Optional:
    /// - `GITHUB_API_URL` (default: "https://api.github.com")
    /// - `DEPLOY_GITHUB_ORG` (default: "port-labs")
    /// - `DEPLOY_TARGET_REPO` (default: "resource-catalog-microservice-repo")
    /// - `DEPLOY_TARGET_WORKFLOW` (default: "Deploy Recommendation Prod")
    /// - `DEPLOY_TARGET_BRANCH` (default: "main")
    pub fn from_env() -> Result<Self> {
        let token = port_client::required("GITHUB_MACHINE_TOKEN")
            .map_err(|e| TriggerError::Config(e.to_string()))?;

        let mut config = Self::new(token);
        if let Ok(url) = env::var("GITHUB_API_URL") {
            config = config.with_github_api_url(url);
        }
        if let Ok(org) = env::var("DEPLOY_GITHUB_ORG") {
            config.org = org;
        }
        if let Ok(repo) = env::var("DEPLOY_TARGET_REPO") {
            config.repo = repo;
        }
        if let Ok(workflow) = env::var("DEPLOY_TARGET_WORKFLOW") {
            config.workflow = workflow;
        }
        if let Ok(branch) = env::var("DEPLOY_TARGET_BRANCH") {
            config.branch = branch;
        }
        Ok(config)
    }

    /// Set the GitHub API base URL. A trailing slash is stripped.
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the target repository.
    pub fn with_repository(mut self, org: impl Into<String>, repo: impl Into<String>) -> Self {
        self.org = org.into();
        self.repo = repo.into();
        self
    }

    /// Set the workflow name and branch to dispatch.
    pub fn with_workflow(mut self, workflow: impl Into<String>, branch: impl Into<String>) -> Self {
        self.workflow = workflow.into();
        self.branch = branch.into();
        self
    }

    /// `org/repo`.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }
}
