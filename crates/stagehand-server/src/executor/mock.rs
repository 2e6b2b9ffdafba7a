// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock executor for testing.
//!
//! Keeps submitted tasks in memory instead of talking to a real executor.

use async_trait::async_trait;
use stagehand_core::TaskDefinition;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::*;

/// Mock executor for testing.
pub struct MockExecutor {
    tasks: Arc<Mutex<HashMap<String, TaskDefinition>>>,
    cancelled: Arc<Mutex<Vec<String>>>,
    /// If true, every submission fails with a transport error
    pub fail_submit: bool,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            cancelled: Arc::new(Mutex::new(Vec::new())),
            fail_submit: false,
        }
    }

    /// Create a mock executor that is unreachable for submissions.
    pub fn failing() -> Self {
        Self {
            fail_submit: true,
            ..Self::new()
        }
    }

    /// Submitted task by guid.
    pub async fn task(&self, task_guid: &str) -> Option<TaskDefinition> {
        self.tasks.lock().await.get(task_guid).cloned()
    }

    /// Number of distinct tasks submitted.
    pub async fn task_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Guids cancelled so far, in order.
    pub async fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().await.clone()
    }
}

#[async_trait]
impl TaskExecutor for MockExecutor {
    fn executor_type(&self) -> &'static str {
        "mock"
    }

    async fn submit(&self, task: &TaskDefinition) -> Result<()> {
        if self.fail_submit {
            return Err(ExecutorError::Transport("mock executor unreachable".to_string()));
        }

        // Existing guid is a conflict, which counts as success.
        self.tasks
            .lock()
            .await
            .entry(task.task_guid.clone())
            .or_insert_with(|| task.clone());
        Ok(())
    }

    async fn cancel(&self, task_guid: &str) -> Result<()> {
        if !self.tasks.lock().await.contains_key(task_guid) {
            return Err(ExecutorError::NotFound(task_guid.to_string()));
        }
        self.cancelled.lock().await.push(task_guid.to_string());
        Ok(())
    }

    async fn get(&self, task_guid: &str) -> Result<TaskSnapshot> {
        let tasks = self.tasks.lock().await;
        let task = tasks
            .get(task_guid)
            .ok_or_else(|| ExecutorError::NotFound(task_guid.to_string()))?;
        Ok(TaskSnapshot {
            task_guid: task.task_guid.clone(),
            domain: task.domain.clone(),
            state: TaskState::Pending,
        })
    }
}
