// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Stagehand Server - Staging Service
//!
//! An HTTP server responsible for:
//! - Building staging tasks from requests and submitting them to the executor
//! - Cancelling staging tasks
//! - Translating task completions and delivering outcomes to the requester

use std::sync::Arc;
use tracing::{info, warn};

use stagehand_core::{BackendRegistry, DefaultSanitizer, StagingEngine};
use stagehand_server::config::Config;
use stagehand_server::executor::{HttpTaskExecutor, TaskExecutor};
use stagehand_server::handlers::StagerHandlerState;
use stagehand_server::notifier::{HttpNotifier, RetryPolicy};
use stagehand_server::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stagehand_server=info,stagehand_core=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        listen_addr = %config.listen_addr,
        executor_url = %config.executor_url,
        task_domain = %config.task_domain,
        lifecycles = config.lifecycles.len(),
        "Starting Stagehand Server"
    );

    let registry = BackendRegistry::standard(
        config.backend_config(),
        Arc::new(config.registry_resolver()),
    );
    let engine = Arc::new(StagingEngine::new(
        registry,
        config.task_domain.clone(),
        Arc::new(DefaultSanitizer),
    ));

    let executor = Arc::new(HttpTaskExecutor::new(
        config.executor_url.clone(),
        config.skip_cert_verify,
    )?);
    info!(executor_type = executor.executor_type(), "Executor initialized");

    let notifier = Arc::new(HttpNotifier::new(
        config.cc_base_url.clone(),
        config.cc_username.clone(),
        config.cc_password.clone(),
    )?);

    let state = Arc::new(
        StagerHandlerState::new(engine, executor, notifier)
            .with_retry_policy(RetryPolicy::with_max_attempts(config.delivery_max_attempts)),
    );

    server::serve(config.listen_addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    })
    .await?;

    info!("Stagehand Server shut down");

    Ok(())
}
