// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lambda entrypoint for the deployment trigger.

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use port_client::{PortClient, PortConfig, telemetry};
use port_deployment_trigger::{DeploymentConfig, GitHubClient, HttpInvocation, handle_invocation};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    telemetry::init_subscriber();

    let port_config = PortConfig::from_env()?;
    let config = DeploymentConfig::from_env()?;
    info!(?port_config, ?config, "Starting port-deployment-trigger");

    let port = PortClient::new(port_config)?;
    let github = GitHubClient::new(&config)?;
    let (port, github, config) = (&port, &github, &config);

    run(service_fn(move |event: LambdaEvent<HttpInvocation>| async move {
        debug!(request_id = %event.context.request_id, "Received event");
        handle_invocation(port, github, config, &event.payload)
            .await
            .map_err(|e| {
                error!(error = %e, "Deployment trigger failed");
                Error::from(e)
            })
    }))
    .await
}

