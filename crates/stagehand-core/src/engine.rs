// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Staging engine: the entry point for building recipes and translating
//! completions.
//!
//! The engine owns the backend registry and the sanitizer and holds no other
//! state. Build it once at startup and share it behind an `Arc`.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::annotation;
use crate::backend::BackendRegistry;
use crate::error::{ErrorKind, Result, StagingError};
use crate::models::{
    Lifecycle, StagingFailure, StagingRequest, StagingResponse, TaskCompletion, TaskDefinition,
};
use crate::sanitize::{Sanitizer, failure_id};

/// Failure id used for synthetic failures built from a [`StagingError`].
pub const STAGING_ERROR_ID: &str = "StagingError";

/// Builds staging recipes and turns task completions into staging outcomes.
pub struct StagingEngine {
    registry: BackendRegistry,
    task_domain: String,
    sanitizer: Arc<dyn Sanitizer>,
}

impl StagingEngine {
    /// Create a new engine.
    pub fn new(
        registry: BackendRegistry,
        task_domain: impl Into<String>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            registry,
            task_domain: task_domain.into(),
            sanitizer,
        }
    }

    /// Domain stamped on the tasks this engine builds.
    pub fn task_domain(&self) -> &str {
        &self.task_domain
    }

    /// Build the task for a staging request.
    ///
    /// The task guid is `staging_guid`, so building twice for the same
    /// request yields the same identifier.
    pub fn build_recipe(
        &self,
        staging_guid: &str,
        request: &StagingRequest,
    ) -> Result<TaskDefinition> {
        self.build_task(staging_guid, request).map(|(_, task)| task)
    }

    /// Like [`build_recipe`](Self::build_recipe), also returning the
    /// lifecycle the task was built for.
    pub fn build_task(
        &self,
        staging_guid: &str,
        request: &StagingRequest,
    ) -> Result<(Lifecycle, TaskDefinition)> {
        let lifecycle: Lifecycle = request.lifecycle.parse()?;
        let backend = self.registry.get(lifecycle)?;
        let task = backend.build_recipe(staging_guid, request)?;

        info!(
            staging_guid = %staging_guid,
            lifecycle = %lifecycle,
            memory_mb = task.memory_mb,
            disk_mb = task.disk_mb,
            timeout_ms = task.timeout_ms,
            "Staging recipe built"
        );
        Ok((lifecycle, task))
    }

    /// Translate a task completion into the outcome for the requester.
    ///
    /// Completions from another domain are rejected. A failed task becomes an
    /// error outcome carrying the sanitized reason; a successful one is parsed
    /// by the backend that built it.
    pub fn translate_completion(&self, completion: &TaskCompletion) -> Result<StagingResponse> {
        if completion.domain != self.task_domain {
            warn!(
                task_guid = %completion.task_guid,
                domain = %completion.domain,
                expected = %self.task_domain,
                "Completion for foreign task domain"
            );
            return Err(StagingError::WrongTaskDomain {
                expected: self.task_domain.clone(),
                actual: completion.domain.clone(),
            });
        }

        let lifecycle = annotation::decode(&completion.annotation).inspect_err(|e| {
            error!(
                task_guid = %completion.task_guid,
                error = %e,
                "Failed to route completion by annotation"
            );
        })?;
        let backend = self.registry.get(lifecycle)?;

        if completion.failed {
            info!(
                task_guid = %completion.task_guid,
                lifecycle = %lifecycle,
                reason = %completion.failure_reason,
                "Staging task failed"
            );
            return Ok(StagingResponse::Error(StagingFailure {
                id: failure_id(&completion.failure_reason).to_string(),
                message: self.sanitizer.sanitize(&completion.failure_reason),
            }));
        }

        let result = backend.build_staging_result(completion).inspect_err(|e| {
            error!(
                task_guid = %completion.task_guid,
                lifecycle = %lifecycle,
                error = %e,
                "Failed to parse staging result"
            );
        })?;

        info!(
            task_guid = %completion.task_guid,
            lifecycle = %lifecycle,
            "Staging task succeeded"
        );
        Ok(StagingResponse::Result(result))
    }

    /// Synthetic failure outcome for a request that never produced a task.
    ///
    /// Validation messages describe the request and go out verbatim; any
    /// other message may name operator configuration and is sanitized.
    pub fn build_failure(&self, err: &StagingError) -> StagingResponse {
        let message = match err.kind() {
            ErrorKind::Validation => err.to_string(),
            _ => self.sanitizer.sanitize(&err.to_string()),
        };
        StagingResponse::Error(StagingFailure {
            id: STAGING_ERROR_ID.to_string(),
            message,
        })
    }
}
