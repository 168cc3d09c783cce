// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Provision a service from a project.
//!
//! Handles the `create_service` day-2 action invoked on a `project` entity:
//! a new `service` entity is created, related to the project through the
//! `serviceProject` relation, and the action run status is reported back.

use port_client::messages::DAY2_TRIGGER;
use port_client::{
    ActionInvocation, EncodedRecord, Entity, HandlerResponse, MismatchPolicy, PortClient,
    PortError, RecordBatch, Result, RunStatus, RunStatusUpdate, decode_record,
};
use tracing::{debug, info, instrument, warn};

/// Blueprint of the entities this handler creates.
pub const SERVICE_BLUEPRINT: &str = "service";

/// Action identifier this handler serves.
pub const CREATE_SERVICE_ACTION: &str = "create_service";

/// Relation linking a service to its project.
pub const SERVICE_PROJECT_RELATION: &str = "serviceProject";

/// Returned when a batch is abandoned because of a foreign action.
pub const NOT_DIRECTED_MESSAGE: &str = "Not directed at this lambda";

/// What happened to a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Service created (or attempted) and run status reported.
    Reported { entity_code: u16, status: RunStatus },
    /// The invocation was for another trigger or action.
    NotDirected,
}

/// True when the invocation is the day-2 `create_service` action.
pub fn is_directed(invocation: &ActionInvocation) -> bool {
    invocation.trigger() == DAY2_TRIGGER && invocation.action_identifier() == CREATE_SERVICE_ACTION
}

/// Build the `service` entity related to `project`.
pub fn build_service_entity(invocation: &ActionInvocation, project: &str) -> Result<Entity> {
    let payload = &invocation.payload;
    let entity = Entity::titled(payload.str_property("title")?)
        .with_property(
            "number_of_replicas",
            payload.property("number_of_replicas")?.clone(),
        )
        .with_property("service_type", payload.property("service_type")?.clone())
        .with_relation(SERVICE_PROJECT_RELATION, project);
    Ok(entity)
}

/// Handle one decoded invocation.
#[instrument(skip_all, fields(run_id = %invocation.run_id()))]
pub async fn process_invocation(
    client: &PortClient,
    invocation: &ActionInvocation,
) -> Result<Outcome> {
    if !is_directed(invocation) {
        debug!(
            trigger = %invocation.trigger(),
            action = %invocation.action_identifier(),
            "Ignoring invocation"
        );
        return Ok(Outcome::NotDirected);
    }

    let project = invocation
        .context
        .entity
        .as_deref()
        .ok_or_else(|| PortError::missing_field("context.entity"))?;

    let entity = build_service_entity(invocation, project)?;
    let entity_code = client
        .create_blueprint_entity(SERVICE_BLUEPRINT, &entity)
        .await?;

    let status = RunStatus::from_status_code(entity_code);
    client
        .report_run_status(invocation.run_id(), &RunStatusUpdate::action_status(status))
        .await?;

    Ok(Outcome::Reported {
        entity_code,
        status,
    })
}

/// Decode and handle one record.
pub async fn process_record(client: &PortClient, record: &EncodedRecord) -> Result<Outcome> {
    let invocation: ActionInvocation = decode_record(record)?;
    process_invocation(client, &invocation).await
}

/// Handle a whole batch, partition by partition.
///
/// Failures are logged and do not stop the batch. A foreign action is
/// skipped, or ends the batch early under [`MismatchPolicy::Abort`].
#[instrument(skip_all, fields(records = batch.len()))]
pub async fn handle_batch(
    client: &PortClient,
    policy: MismatchPolicy,
    batch: &RecordBatch,
) -> HandlerResponse {
    for (partition, record) in batch.iter() {
        match process_record(client, record).await {
            Ok(Outcome::Reported {
                entity_code,
                status,
            }) => {
                info!(partition, entity_code, %status, "Service provisioned");
            }
            Ok(Outcome::NotDirected) => {
                if policy == MismatchPolicy::Abort {
                    info!(partition, "Message not directed to this handler, stopping batch");
                    return HandlerResponse::new(NOT_DIRECTED_MESSAGE);
                }
            }
            Err(e) => {
                warn!(
                    partition,
                    offset = ?record.offset,
                    category = %e.category(),
                    error = %e,
                    "Failed to process message"
                );
            }
        }
    }

    HandlerResponse::ok()
}
