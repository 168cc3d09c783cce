// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire types for the Port API.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Run status
// ============================================================================

/// Coarse status of an action run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Failure,
    InProgress,
}

impl RunStatus {
    /// Map an HTTP status code to a run status.
    ///
    /// 2xx is a success, 4xx and 5xx are failures, anything else is still in progress.
    pub fn from_status_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Success,
            400.. => Self::Failure,
            _ => Self::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::InProgress => "IN_PROGRESS",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `PATCH /actions/runs/{runId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatusUpdate {
    pub status: RunStatus,
    pub message: RunMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMessage {
    pub message: String,
}

impl RunStatusUpdate {
    pub fn new(status: RunStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: RunMessage {
                message: message.into(),
            },
        }
    }

    /// Update carrying the generic "The action status is ..." message.
    pub fn action_status(status: RunStatus) -> Self {
        Self::new(status, format!("The action status is {}", status))
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Derive an entity identifier from its title: spaces become hyphens, then lower-cased.
pub fn identifier_from_title(title: &str) -> String {
    title.replace(' ', "-").to_lowercase()
}

/// A catalog entity document sent to Port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub identifier: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Map<String, Value>>,
}

impl Entity {
    /// Create an entity whose identifier is derived from the title.
    pub fn titled(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            identifier: identifier_from_title(&title),
            title,
            blueprint: None,
            properties: Map::new(),
            relations: None,
        }
    }

    pub fn with_blueprint(mut self, blueprint: impl Into<String>) -> Self {
        self.blueprint = Some(blueprint.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, target: impl Into<Value>) -> Self {
        self.relations
            .get_or_insert_with(Map::new)
            .insert(name.into(), target.into());
        self
    }
}

/// Body of `PATCH /blueprints/{blueprint}/entities/{identifier}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPatch {
    pub properties: Map<String, Value>,
}

impl EntityPatch {
    pub fn property(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut properties = Map::new();
        properties.insert(name.into(), value.into());
        Self { properties }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Body of `POST /auth/access_token`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CredentialsBody<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// Response of the credential exchange.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenResponse {
    pub access_token: Option<String>,
}

// ============================================================================
// Handler output
// ============================================================================

/// Small status document returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    pub message: String,
}

impl HandlerResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new("ok")
    }
}
