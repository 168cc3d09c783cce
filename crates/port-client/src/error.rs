// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for port-client.

use std::fmt;

use thiserror::Error;

/// Result type using PortError.
pub type Result<T> = std::result::Result<T, PortError>;

/// Errors that can occur while decoding messages or talking to the Port API.
#[derive(Debug, Error)]
pub enum PortError {
    /// Configuration error (missing or invalid environment values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Record value could not be decoded (base64, UTF-8 or JSON syntax).
    #[error("decode error: {0}")]
    Decode(String),

    /// Message decoded but does not have the expected shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Transport-level failure talking to the Port API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Port answered with something we cannot use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Outbound document could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification used when logging per-message failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The inbound message was unusable.
    Input,
    /// A downstream call failed or returned garbage.
    Downstream,
    /// The process is misconfigured.
    Configuration,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Downstream => "downstream",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PortError {
    /// Category of this error for structured logging.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PortError::Decode(_) | PortError::MalformedMessage(_) => ErrorCategory::Input,
            PortError::Http(_) | PortError::UnexpectedResponse(_) | PortError::Serialization(_) => {
                ErrorCategory::Downstream
            }
            PortError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Shorthand for a missing required field in an inbound message.
    pub fn missing_field(field: &str) -> Self {
        PortError::MalformedMessage(format!("missing required field `{}`", field))
    }
}

impl From<serde_json::Error> for PortError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match err.classify() {
            Category::Data => PortError::MalformedMessage(err.to_string()),
            Category::Syntax | Category::Eof => PortError::Decode(err.to_string()),
            Category::Io => PortError::Serialization(err.to_string()),
        }
    }
}

impl From<base64::DecodeError> for PortError {
    fn from(err: base64::DecodeError) -> Self {
        PortError::Decode(format!("invalid base64: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for PortError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        PortError::Decode(format!("invalid UTF-8: {}", err))
    }
}
