// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the Port API client.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PortError, Result};

/// Default Port API base URL.
pub const DEFAULT_API_URL: &str = "https://api.getport.io/v1";

/// How the client exchanges its credentials for an access token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialExchange {
    /// `POST /auth/access_token` with `{"clientId", "clientSecret"}`.
    #[default]
    Json,
    /// `GET /auth/access_token?client_id=..&client_secret=..` (legacy v0.1 API).
    Query,
}

impl FromStr for CredentialExchange {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "post" => Ok(Self::Json),
            "query" | "get" => Ok(Self::Query),
            other => Err(PortError::Config(format!(
                "invalid PORT_CREDENTIAL_EXCHANGE: {} (expected json or query)",
                other
            ))),
        }
    }
}

/// What a batch handler does with a message that is not meant for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Skip the message and keep processing the batch.
    #[default]
    Skip,
    /// Stop processing the whole batch and return immediately.
    Abort,
}

impl FromStr for MismatchPolicy {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "skip" | "continue" => Ok(Self::Skip),
            "abort" | "return" => Ok(Self::Abort),
            other => Err(PortError::Config(format!(
                "invalid PORT_MISMATCH_POLICY: {} (expected skip or abort)",
                other
            ))),
        }
    }
}

impl MismatchPolicy {
    /// Read `PORT_MISMATCH_POLICY` (default: skip).
    pub fn from_env() -> Result<Self> {
        match env::var("PORT_MISMATCH_POLICY") {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Configuration for the PortClient.
#[derive(Clone)]
pub struct PortConfig {
    /// Port client identifier.
    pub client_id: String,
    /// Port client secret.
    pub client_secret: String,
    /// Base URL of the Port API, without trailing slash.
    pub api_url: String,
    /// Credential exchange flavour.
    pub credential_exchange: CredentialExchange,
    /// Optional per-request timeout. `None` keeps the HTTP client default.
    pub request_timeout: Option<Duration>,
}

impl fmt::Debug for PortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("credential_exchange", &self.credential_exchange)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl PortConfig {
    /// Create a configuration with the default API URL.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_url: DEFAULT_API_URL.to_string(),
            credential_exchange: CredentialExchange::default(),
            request_timeout: None,
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Required:
    /// - `PORT_CLIENT_ID`
    /// - `PORT_CLIENT_SECRET`
    ///
    /// Optional:
    /// - `PORT_API_URL` (default: "https://api.getport.io/v1")
    /// - `PORT_CREDENTIAL_EXCHANGE`: "json" or "query" (default: "json")
    /// - `PORT_REQUEST_TIMEOUT_MS`: request timeout in milliseconds (default: none)
    pub fn from_env() -> Result<Self> {
        let client_id = required("PORT_CLIENT_ID")?;
        let client_secret = required("PORT_CLIENT_SECRET")?;

        let api_url = env::var("PORT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let credential_exchange = match env::var("PORT_CREDENTIAL_EXCHANGE") {
            Ok(value) => value.parse()?,
            Err(_) => CredentialExchange::default(),
        };

        let request_timeout = match env::var("PORT_REQUEST_TIMEOUT_MS") {
            Ok(value) => {
                let ms: u64 = value.parse().map_err(|e| {
                    PortError::Config(format!("invalid PORT_REQUEST_TIMEOUT_MS: {}", e))
                })?;
                Some(Duration::from_millis(ms))
            }
            Err(_) => None,
        };

        Ok(Self::new(client_id, client_secret)
            .with_api_url(api_url)
            .with_credential_exchange(credential_exchange)
            .with_optional_timeout(request_timeout))
    }

    /// Set the API base URL. A trailing slash is stripped.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the credential exchange flavour.
    pub fn with_credential_exchange(mut self, exchange: CredentialExchange) -> Self {
        self.credential_exchange = exchange;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Read a required, non-empty environment variable.
pub fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(PortError::Config(format!("{} is required", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: tests touching the environment run serially.
        unsafe {
            for key in [
                "PORT_CLIENT_ID",
                "PORT_CLIENT_SECRET",
                "PORT_API_URL",
                "PORT_CREDENTIAL_EXCHANGE",
                "PORT_REQUEST_TIMEOUT_MS",
                "PORT_MISMATCH_POLICY",
            ] {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_new_config_defaults() {
        let config = PortConfig::new("id", "secret");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.credential_exchange, CredentialExchange::Json);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = PortConfig::new("id", "secret")
            .with_api_url("http://127.0.0.1:9000/")
            .with_credential_exchange(CredentialExchange::Query)
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.credential_exchange, CredentialExchange::Query);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = PortConfig::new("my-id", "top-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("my-id"));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("query".parse::<CredentialExchange>().unwrap(), CredentialExchange::Query);
        assert_eq!("JSON".parse::<CredentialExchange>().unwrap(), CredentialExchange::Json);
        assert!("soap".parse::<CredentialExchange>().is_err());

        assert_eq!("abort".parse::<MismatchPolicy>().unwrap(), MismatchPolicy::Abort);
        assert_eq!(" Skip ".parse::<MismatchPolicy>().unwrap(), MismatchPolicy::Skip);
        assert!("ignore".parse::<MismatchPolicy>().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_requires_credentials() {
        clear_env();
        let err = PortConfig::from_env().unwrap_err();
        assert!(matches!(err, PortError::Config(_)));
        assert!(err.to_string().contains("PORT_CLIENT_ID"));

        unsafe { env::set_var("PORT_CLIENT_ID", "id") };
        let err = PortConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("PORT_CLIENT_SECRET"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_reads_optional_values() {
        clear_env();
        unsafe {
            env::set_var("PORT_CLIENT_ID", "id");
            env::set_var("PORT_CLIENT_SECRET", "secret");
            env::set_var("PORT_API_URL", "https://api.getport.io/v0.1");
            env::set_var("PORT_CREDENTIAL_EXCHANGE", "query");
            env::set_var("PORT_REQUEST_TIMEOUT_MS", "2500");
        }

        let config = PortConfig::from_env().unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.api_url, "https://api.getport.io/v0.1");
        assert_eq!(config.credential_exchange, CredentialExchange::Query);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(2500)));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_timeout() {
        clear_env();
        unsafe {
            env::set_var("PORT_CLIENT_ID", "id");
            env::set_var("PORT_CLIENT_SECRET", "secret");
            env::set_var("PORT_REQUEST_TIMEOUT_MS", "soon");
        }
        let err = PortConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("PORT_REQUEST_TIMEOUT_MS"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_mismatch_policy_from_env() {
        clear_env();
        assert_eq!(MismatchPolicy::from_env().unwrap(), MismatchPolicy::Skip);
        unsafe { env::set_var("PORT_MISMATCH_POLICY", "abort") };
        assert_eq!(MismatchPolicy::from_env().unwrap(), MismatchPolicy::Abort);
        clear_env();
    }
}
