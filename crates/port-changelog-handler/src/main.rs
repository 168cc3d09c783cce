// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lambda entrypoint for the changelog handler.

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use port_changelog_handler::handle_batch;
use port_client::{PortClient, PortConfig, RecordBatch, telemetry};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    telemetry::init_subscriber();

    let config = PortConfig::from_env()?;
    info!(?config, "Starting port-changelog-handler");

    let client = PortClient::new(config)?;
    let client = &client;

    run(service_fn(move |event: LambdaEvent<RecordBatch>| async move {
        debug!(request_id = %event.context.request_id, records = event.payload.len(), "Received event");
        Ok::<_, Error>(handle_batch(client, &event.payload).await)
    }))
    .await
}
