// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Action-run reporter.
//!
//! Consumes action invocations from a Kafka topic. For every `CREATE` run it
//! registers a `vm` entity built from the action inputs, then reports the
//! run as SUCCESS, FAILURE or IN_PROGRESS depending on how Port answered
//! the entity creation.

use port_client::messages::CREATE_TRIGGER;
use port_client::{
    ActionInvocation, EncodedRecord, Entity, HandlerResponse, MismatchPolicy, PortClient, Result,
    RecordBatch, RunStatus, RunStatusUpdate, decode_record,
};
use tracing::{debug, info, instrument, warn};

/// Blueprint of the entities this handler creates.
pub const VM_BLUEPRINT: &str = "vm";

/// Returned when a batch is abandoned because of a foreign trigger.
pub const NOT_DIRECTED_MESSAGE: &str = "Message not directed to our service";

/// What happened to a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Entity created (or attempted) and run status reported.
    Reported { entity_code: u16, status: RunStatus },
    /// The invocation was for another trigger.
    NotDirected,
}

/// Build the `vm` entity from the action inputs.
pub fn build_vm_entity(invocation: &ActionInvocation) -> Result<Entity> {
    let payload = &invocation.payload;
    let entity = Entity::titled(payload.str_property("title")?)
        .with_blueprint(VM_BLUEPRINT)
        .with_property("cpu_cores", payload.property("cpu")?.clone())
        .with_property("memory_size", payload.property("memory")?.clone())
        .with_property("storage_size", payload.property("storage")?.clone())
        .with_property("region", payload.property("region")?.clone())
        .with_property("deployed", "Deploying");
    Ok(entity)
}

/// Handle one decoded invocation.
#[instrument(skip_all, fields(run_id = %invocation.run_id()))]
pub async fn process_invocation(
    client: &PortClient,
    invocation: &ActionInvocation,
) -> Result<Outcome> {
    if invocation.trigger() != CREATE_TRIGGER {
        debug!(trigger = %invocation.trigger(), "Ignoring invocation");
        return Ok(Outcome::NotDirected);
    }

    let entity = build_vm_entity(invocation)?;
    let entity_code = client
        .create_entity(&entity, Some(invocation.run_id()))
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
/// Failures are logged and do not stop the batch. A foreign trigger is
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
                info!(partition, entity_code, %status, "Action run reported");
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
