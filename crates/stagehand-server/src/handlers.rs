// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Staging request handlers.
//!
//! Framework independent; the HTTP layer in [`crate::server`] only extracts
//! arguments and maps errors to statuses.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stagehand_core::{
    Lifecycle, StagingEngine, StagingError, StagingFailure, StagingRequest, StagingResponse,
    TaskCompletion,
};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::executor::TaskExecutor;
use crate::notifier::{Notifier, RetryPolicy, deliver_with_retry};

/// Shared state for staging handlers.
pub struct StagerHandlerState {
    /// Recipe builder and completion translator.
    pub engine: Arc<StagingEngine>,
    /// Executor staging tasks are submitted to.
    pub executor: Arc<dyn TaskExecutor>,
    /// Delivers outcomes to the requester.
    pub notifier: Arc<dyn Notifier>,
    /// Retry policy for outcome delivery.
    pub retry_policy: RetryPolicy,
    /// When the server started (for uptime calculation).
    pub start_time: std::time::Instant,
    /// Server version string.
    pub version: String,
}

impl StagerHandlerState {
    /// Create a new handler state.
    pub fn new(
        engine: Arc<StagingEngine>,
        executor: Arc<dyn TaskExecutor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            engine,
            executor,
            notifier,
            retry_policy: RetryPolicy::default(),
            start_time: std::time::Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Set the retry policy for outcome delivery.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Get the server uptime in milliseconds.
    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Deliver `response` for `staging_guid`, logging instead of failing.
    async fn deliver_best_effort(&self, staging_guid: &str, response: &StagingResponse) {
        if let Err(e) = self.deliver(staging_guid, response).await {
            error!(staging_guid = %staging_guid, error = %e, "Failed to deliver staging outcome");
        }
    }

    async fn deliver(&self, staging_guid: &str, response: &StagingResponse) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        deliver_with_retry(
            self.notifier.as_ref(),
            staging_guid,
            &payload,
            &self.retry_policy,
        )
        .await?;
        Ok(())
    }
}

// ============================================================================
// Health Check
// ============================================================================

/// Handle health check request.
pub async fn handle_health_check(state: &StagerHandlerState) -> Result<HealthCheckResponse> {
    Ok(HealthCheckResponse {
        healthy: true,
        version: state.version.clone(),
        uptime_ms: state.uptime_ms(),
        executor: state.executor.executor_type().to_string(),
    })
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Server uptime in milliseconds.
    pub uptime_ms: u64,
    /// Executor backend in use.
    pub executor: String,
}

// ============================================================================
// Stage
// ============================================================================

/// Response to an accepted staging request.
#[derive(Debug, Serialize, Deserialize)]
pub struct StageResponse {
    /// Guid of the submitted task.
    pub task_guid: String,
    /// Lifecycle the task was built for.
    pub lifecycle: Lifecycle,
}

/// Handle a staging request.
///
/// A request that cannot be turned into a task still produces an outcome:
/// a synthetic failure is delivered to the requester before the error is
/// returned.
pub async fn handle_stage(
    state: &StagerHandlerState,
    staging_guid: &str,
    request: StagingRequest,
) -> Result<StageResponse> {
    info!(
        staging_guid = %staging_guid,
        app_id = %request.app_id,
        lifecycle = %request.lifecycle,
        "Staging request received"
    );

    let (lifecycle, task) = match state.engine.build_task(staging_guid, &request) {
        Ok(built) => built,
        Err(e) => {
            warn!(
                staging_guid = %staging_guid,
                error_code = e.error_code(),
                error = %e,
                "Failed to build staging recipe"
            );
            state
                .deliver_best_effort(staging_guid, &state.engine.build_failure(&e))
                .await;
            return Err(e.into());
        }
    };

    if let Err(e) = state.executor.submit(&task).await {
        error!(
            staging_guid = %staging_guid,
            executor = state.executor.executor_type(),
            error = %e,
            "Failed to submit staging task"
        );
        let failure = StagingResponse::Error(StagingFailure {
            id: stagehand_core::engine::STAGING_ERROR_ID.to_string(),
            message: "staging failed: task could not be submitted".to_string(),
        });
        state.deliver_best_effort(staging_guid, &failure).await;
        return Err(e.into());
    }

    info!(staging_guid = %staging_guid, lifecycle = %lifecycle, "Staging task submitted");

    Ok(StageResponse {
        task_guid: task.task_guid,
        lifecycle,
    })
}

// ============================================================================
// Stop Staging
// ============================================================================

/// Handle a request to stop a staging task.
///
/// Only tasks in the staging domain can be stopped through this service.
pub async fn handle_stop_staging(state: &StagerHandlerState, staging_guid: &str) -> Result<()> {
    let snapshot = state.executor.get(staging_guid).await?;
    if snapshot.domain != state.engine.task_domain() {
        return Err(StagingError::WrongTaskDomain {
            expected: state.engine.task_domain().to_string(),
            actual: snapshot.domain,
        }
        .into());
    }

    state.executor.cancel(staging_guid).await?;
    info!(staging_guid = %staging_guid, "Staging task cancelled");
    Ok(())
}

// ============================================================================
// Staging Complete
// ============================================================================

/// Handle a task completion callback.
///
/// Translates the completion and delivers the outcome. Returns the outcome
/// that was delivered.
pub async fn handle_staging_complete(
    state: &StagerHandlerState,
    staging_guid: &str,
    completion: TaskCompletion,
) -> Result<StagingResponse> {
    if completion.task_guid != staging_guid {
        return Err(Error::InvalidRequest(format!(
            "completion for task '{}' posted to staging guid '{}'",
            completion.task_guid, staging_guid
        )));
    }

    let response = state.engine.translate_completion(&completion)?;
    state.deliver(staging_guid, &response).await?;
    Ok(response)
}
