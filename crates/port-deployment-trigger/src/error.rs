// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the deployment trigger.

use port_client::PortError;
use thiserror::Error;

/// Result type using TriggerError.
pub type Result<T> = std::result::Result<T, TriggerError>;

/// Errors that abort a deployment invocation.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Configuration error (missing or invalid environment values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The invocation body is not a usable request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// GitHub answered with a non-success status.
    #[error("GitHub API error [{status}]: {message}")]
    GitHub { status: u16, message: String },

    /// Transport-level failure talking to GitHub.
    #[error("GitHub request failed: {0}")]
    GitHubHttp(#[from] reqwest::Error),

    /// No workflow in the repository carries the configured name.
    #[error("workflow '{workflow}' not found in {repository}")]
    WorkflowNotFound {
        workflow: String,
        repository: String,
    },

    /// Failure talking to Port.
    #[error(transparent)]
    Port(#[from] PortError),
}

impl From<serde_json::Error> for TriggerError {
    fn from(err: serde_json::Error) -> Self {
        TriggerError::InvalidRequest(err.to_string())
    }
}
