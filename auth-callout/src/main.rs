/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */


//! Auth callout entry point.
//!
//! Connects to NATS as the callout's auth-exempt user and answers connection
//! requests on the callout subject until interrupted.

use auth_callout::config::Config;
use auth_callout::service::CalloutService;
use auth_callout::transport;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;
    tracing::info!("Loaded configuration: {config:?}");

    let service = Arc::new(CalloutService::from_config(&config)?);
    tracing::info!("Issuing credentials as {}", service.issuer());

    let mut options = async_nats::ConnectOptions::new().name("auth-callout");
    if let Some((user, password)) = &config.nats_user {
        options = options.user_and_password(user.clone(), password.clone());
    }
    let client = options.connect(&config.nats_url).await?;
    tracing::info!("Connected to NATS at {}", config.nats_url);

    transport::run(
        client,
        service,
        config.callout_subject.clone(),
        config.queue_group.clone(),
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
        },
    )
    .await?;

    tracing::info!("Auth callout stopped");
    Ok(())
}
