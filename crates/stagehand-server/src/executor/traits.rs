// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Task executor trait definitions.
//!
//! Defines the abstract interface to the external system that runs staging
//! tasks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stagehand_core::TaskDefinition;
use thiserror::Error;

/// Errors from executor operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// The task does not exist.
    #[error("Task not found: {0}")]
    NotFound(String),

    /// The executor answered with an unexpected status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The executor could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error.
    #[error("Other: {0}")]
    Other(String),
}

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Accepted, not yet placed
    Pending,
    /// Running on a cell
    Running,
    /// Finished, completion callback not yet acknowledged
    Completed,
    /// Completion callback in flight
    Resolving,
}

/// Executor's view of a submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier
    pub task_guid: String,
    /// Workload domain the task was submitted under
    pub domain: String,
    /// Current state
    pub state: TaskState,
}

/// Trait for task executors.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Executor type name, for logging.
    fn executor_type(&self) -> &'static str;

    /// Submit a task. Submitting a task guid that already exists succeeds.
    async fn submit(&self, task: &TaskDefinition) -> Result<()>;

    /// Cancel a task.
    async fn cancel(&self, task_guid: &str) -> Result<()>;

    /// Look up a task.
    async fn get(&self, task_guid: &str) -> Result<TaskSnapshot>;
}
