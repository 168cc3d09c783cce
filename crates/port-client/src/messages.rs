// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed schemas for the messages Port publishes to the handlers.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{PortError, Result};

/// Trigger label of a self-service action creating a new entity.
pub const CREATE_TRIGGER: &str = "CREATE";
/// Trigger label of a day-2 operation on an existing entity.
pub const DAY2_TRIGGER: &str = "DAY-2";

// ============================================================================
// Action invocations
// ============================================================================

/// One execution of a self-service action.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionInvocation {
    pub context: RunContext,
    pub payload: ActionPayload,
}

impl ActionInvocation {
    pub fn run_id(&self) -> &str {
        &self.context.run_id
    }

    pub fn trigger(&self) -> &str {
        &self.payload.action.trigger
    }

    /// Action identifier, empty when absent.
    pub fn action_identifier(&self) -> &str {
        self.payload.action.identifier.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    pub run_id: String,
    /// Entity the action was invoked on (day-2 actions).
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub blueprint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionPayload {
    pub action: ActionRef,
    /// User inputs of the action form.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRef {
    pub trigger: String,
    #[serde(default)]
    pub identifier: Option<String>,
}

impl ActionPayload {
    /// A required action input.
    pub fn property(&self, name: &str) -> Result<&Value> {
        self.properties
            .get(name)
            .ok_or_else(|| PortError::missing_field(&format!("payload.properties.{}", name)))
    }

    /// A required string action input.
    pub fn str_property(&self, name: &str) -> Result<&str> {
        self.property(name)?.as_str().ok_or_else(|| {
            PortError::MalformedMessage(format!("payload.properties.{} must be a string", name))
        })
    }
}

// ============================================================================
// Change events
// ============================================================================

/// A change that happened in the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// CREATE, UPDATE or DELETE.
    pub action: String,
    /// entity, blueprint, run, ...
    pub resource_type: String,
    #[serde(default)]
    pub context: ChangeContext,
    #[serde(default)]
    pub diff: ChangeDiff,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeContext {
    #[serde(default)]
    pub blueprint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeDiff {
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
}

/// Entity state carried in a change diff.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitySnapshot {
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ChangeEvent {
    pub fn is_entity_update(&self) -> bool {
        self.action == "UPDATE" && self.resource_type == "entity"
    }

    pub fn blueprint(&self) -> Result<&str> {
        self.context
            .blueprint
            .as_deref()
            .ok_or_else(|| PortError::missing_field("context.blueprint"))
    }

    /// Entity state after the change.
    pub fn entity_after(&self) -> Result<EntitySnapshot> {
        let after = self
            .diff
            .after
            .clone()
            .filter(|v| !v.is_null())
            .ok_or_else(|| PortError::missing_field("diff.after"))?;
        Ok(serde_json::from_value(after)?)
    }
}

impl EntitySnapshot {
    /// A required numeric property.
    pub fn number_property(&self, name: &str) -> Result<f64> {
        let value = self
            .properties
            .get(name)
            .ok_or_else(|| PortError::missing_field(&format!("diff.after.properties.{}", name)))?;
        value.as_f64().ok_or_else(|| {
            PortError::MalformedMessage(format!("diff.after.properties.{} must be a number", name))
        })
    }
}
