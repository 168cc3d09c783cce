// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Changelog handler.
//!
//! Watches entity UPDATE events from the catalog changelog topic. When a
//! VM's free storage drops below 10% of its total storage, storage is freed
//! up (simulated) and the new `free_storage` value is written back to Port.

use port_client::{
    ChangeEvent, EncodedRecord, EntityPatch, HandlerResponse, PortClient, RecordBatch, Result,
    decode_record,
};
use tracing::{debug, info, instrument, warn};

/// Free storage reported after the cleanup.
pub const FREE_STORAGE_AFTER_CLEANUP: i64 = 4;

/// Fraction of total storage under which remediation kicks in.
pub const LOW_STORAGE_RATIO: f64 = 0.1;

/// What happened to a single change event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Not an entity update.
    Ignored,
    /// Enough free storage, nothing to do.
    Healthy,
    /// Storage was freed and the entity patched.
    Remediated { entity_code: u16 },
}

/// True when free storage is below [`LOW_STORAGE_RATIO`] of the total.
pub fn needs_remediation(storage_size: f64, free_storage: f64) -> bool {
    free_storage < storage_size * LOW_STORAGE_RATIO
}

/// Handle one decoded change event.
#[instrument(skip_all, fields(action = %event.action, resource_type = %event.resource_type))]
pub async fn process_event(client: &PortClient, event: &ChangeEvent) -> Result<Outcome> {
    if !event.is_entity_update() {
        debug!("Ignoring change event");
        return Ok(Outcome::Ignored);
    }

    let blueprint = event.blueprint()?;
    let entity = event.entity_after()?;
    let storage_size = entity.number_property("storage_size")?;
    let free_storage = entity.number_property("free_storage")?;

    if !needs_remediation(storage_size, free_storage) {
        debug!(identifier = %entity.identifier, storage_size, free_storage, "Free storage is fine");
        return Ok(Outcome::Healthy);
    }

    warn!(
        identifier = %entity.identifier,
        storage_size,
        free_storage,
        "Entity {} free storage is too low, fixing...",
        entity.title
    );
    // Storage extension through the cloud provider would happen here.
    info!("Entity {} storage freed up, updating in Port", entity.title);

    let patch = EntityPatch::property("free_storage", FREE_STORAGE_AFTER_CLEANUP);
    let entity_code = client
        .update_entity_properties(blueprint, &entity.identifier, &patch)
        .await?;

    Ok(Outcome::Remediated { entity_code })
}

/// Decode and handle one record.
pub async fn process_record(client: &PortClient, record: &EncodedRecord) -> Result<Outcome> {
    let event: ChangeEvent = decode_record(record)?;
    process_event(client, &event).await
}

/// Handle a whole batch. Failures are logged and never stop the batch.
#[instrument(skip_all, fields(records = batch.len()))]
pub async fn handle_batch(client: &PortClient, batch: &RecordBatch) -> HandlerResponse {
    for (partition, record) in batch.iter() {
        match process_record(client, record).await {
            Ok(Outcome::Remediated { entity_code }) => {
                info!(partition, entity_code, "Entity updated");
            }
            Ok(_) => {}
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
