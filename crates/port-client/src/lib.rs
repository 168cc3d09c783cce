// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Port Client
//!
//! Shared plumbing for the Port Lambda handlers:
//! - Port REST client (credential exchange, entities, action run status)
//! - Explicit configuration read from the environment at startup
//! - Streaming batch decoding (base64 → UTF-8 → typed JSON message)
//! - Typed message schemas and error categories
//! - Tracing subscriber initialization
//!
//! # Example
//!
//! ```no_run
//! use port_client::{Entity, PortClient, PortConfig, RunStatus, RunStatusUpdate};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PortClient::new(PortConfig::from_env()?)?;
//!
//! let entity = Entity::titled("Web Server 01")
//!     .with_blueprint("vm")
//!     .with_property("region", "eu-west-1");
//! let code = client.create_entity(&entity, Some("r_123")).await?;
//!
//! let update = RunStatusUpdate::action_status(RunStatus::from_status_code(code));
//! client.report_run_status("r_123", &update).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod messages;
pub mod records;
pub mod telemetry;
mod types;

pub use client::PortClient;
pub use config::{CredentialExchange, DEFAULT_API_URL, MismatchPolicy, PortConfig, required};
pub use error::{ErrorCategory, PortError, Result};
pub use messages::{ActionInvocation, ChangeEvent, EntitySnapshot, RunContext};
pub use records::{EncodedRecord, Partitions, RecordBatch, decode_record, decode_text};
pub use types::{
    Entity, EntityPatch, HandlerResponse, RunMessage, RunStatus, RunStatusUpdate,
    identifier_from_title,
};
