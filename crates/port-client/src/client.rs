// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PortClient for interacting with the Port REST API.

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{CredentialExchange, PortConfig};
use crate::error::{PortError, Result};
use crate::types::{AccessTokenResponse, CredentialsBody, Entity, EntityPatch, RunStatusUpdate};

/// Thin client for the Port API.
///
/// Every operation exchanges the configured credentials for a fresh access
/// token before issuing its own request. Tokens are never cached, so one
/// operation always costs exactly two HTTP calls.
///
/// Catalog operations return the HTTP status code Port answered with instead
/// of failing on non-2xx responses; callers map it with
/// [`RunStatus::from_status_code`](crate::RunStatus::from_status_code).
/// Only transport failures and unusable token responses are errors.
#[derive(Debug, Clone)]
pub struct PortClient {
    http: reqwest::Client,
    config: PortConfig,
}

impl PortClient {
    /// Create a new client with the given configuration.
    pub fn new(config: PortConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| PortError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(PortConfig::from_env()?)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange the client credentials for a bearer token.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<String> {
        info!("Fetching token");

        let url = self.url("/auth/access_token");
        let request = match self.config.credential_exchange {
            CredentialExchange::Json => self.http.post(url).json(&CredentialsBody {
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
            }),
            CredentialExchange::Query => self.http.get(url).query(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ]),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let token: AccessTokenResponse = serde_json::from_str(&text).map_err(|e| {
            PortError::UnexpectedResponse(format!(
                "token exchange returned {} with unreadable body: {}",
                status, e
            ))
        })?;

        token.access_token.ok_or_else(|| {
            PortError::UnexpectedResponse(format!(
                "token exchange returned {} without accessToken",
                status
            ))
        })
    }

    /// Send an authorized JSON request and return the response status code.
    async fn send_authorized<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<u16> {
        let token = self.access_token().await?;

        let request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(body);
        let response = configure(request).send().await?;

        let status = response.status().as_u16();
        info!(status, "Port responded");
        match response.text().await {
            Ok(text) => debug!(body = %text, "Port response body"),
            Err(e) => warn!(status, error = %e, "Failed to read Port response body"),
        }

        Ok(status)
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Create an entity through `POST /entities`, optionally linked to an action run.
    ///
    /// The entity must carry its blueprint.
    #[instrument(skip(self, entity), fields(identifier = %entity.identifier))]
    pub async fn create_entity(&self, entity: &Entity, run_id: Option<&str>) -> Result<u16> {
        info!(entity = %to_log_json(entity), "Creating entity");

        self.send_authorized(Method::POST, "/entities", entity, |request| match run_id {
            Some(run_id) => request.query(&[("run_id", run_id)]),
            None => request,
        })
        .await
    }

    /// Create an entity through `POST /blueprints/{blueprint}/entities`.
    #[instrument(skip(self, entity), fields(identifier = %entity.identifier))]
    pub async fn create_blueprint_entity(&self, blueprint: &str, entity: &Entity) -> Result<u16> {
        info!(entity = %to_log_json(entity), "Creating entity");

        let path = format!("/blueprints/{}/entities", blueprint);
        self.send_authorized(Method::POST, &path, entity, |request| request)
            .await
    }

    /// Patch some properties of an existing entity.
    #[instrument(skip(self, patch))]
    pub async fn update_entity_properties(
        &self,
        blueprint: &str,
        identifier: &str,
        patch: &EntityPatch,
    ) -> Result<u16> {
        info!(patch = %to_log_json(patch), "Updating entity property values");

        let path = format!("/blueprints/{}/entities/{}", blueprint, identifier);
        self.send_authorized(Method::PATCH, &path, patch, |request| request)
            .await
    }

    // =========================================================================
    // Action runs
    // =========================================================================

    /// Report the status of an action run.
    #[instrument(skip(self, update), fields(status = %update.status))]
    pub async fn report_run_status(&self, run_id: &str, update: &RunStatusUpdate) -> Result<u16> {
        info!(body = %to_log_json(update), "Reporting action {} status", run_id);

        let path = format!("/actions/runs/{}", run_id);
        self.send_authorized(Method::PATCH, &path, update, |request| request)
            .await
    }
}

fn to_log_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}
