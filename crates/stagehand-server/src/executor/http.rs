// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP task executor client.
//!
//! | Operation | Request                        | Success          |
//! |-----------|--------------------------------|------------------|
//! | submit    | `POST /v1/tasks`               | 2xx, 409         |
//! | cancel    | `DELETE /v1/tasks/{task_guid}` | 2xx (404 = gone) |
//! | get       | `GET /v1/tasks/{task_guid}`    | 200 (404 = gone) |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use stagehand_core::TaskDefinition;
use tracing::{debug, info};

use super::traits::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Executor reached over its HTTP task API.
pub struct HttpTaskExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskExecutor {
    /// Create a client for the executor at `base_url`.
    pub fn new(base_url: impl Into<String>, skip_cert_verify: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(skip_cert_verify)
            .build()
            .map_err(|e| ExecutorError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}/v1/tasks", self.base_url)
    }

    fn task_url(&self, task_guid: &str) -> String {
        format!("{}/v1/tasks/{}", self.base_url, task_guid)
    }
}

fn transport(err: reqwest::Error) -> ExecutorError {
    ExecutorError::Transport(err.to_string())
}

async fn unexpected(response: reqwest::Response) -> ExecutorError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ExecutorError::Status { status, body }
}

#[async_trait]
impl TaskExecutor for HttpTaskExecutor {
    fn executor_type(&self) -> &'static str {
        "http"
    }

    async fn submit(&self, task: &TaskDefinition) -> Result<()> {
        let response = self
            .client
            .post(self.tasks_url())
            .json(task)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => {
                info!(task_guid = %task.task_guid, "Task submitted");
                Ok(())
            }
            StatusCode::CONFLICT => {
                info!(task_guid = %task.task_guid, "Task already submitted");
                Ok(())
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn cancel(&self, task_guid: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.task_url(task_guid))
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => {
                debug!(task_guid = %task_guid, "Task cancelled");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(ExecutorError::NotFound(task_guid.to_string())),
            _ => Err(unexpected(response).await),
        }
    }

    async fn get(&self, task_guid: &str) -> Result<TaskSnapshot> {
        let response = self
            .client
            .get(self.task_url(task_guid))
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await.map_err(transport)?;
                Ok(serde_json::from_slice(&body)?)
            }
            StatusCode::NOT_FOUND => Err(ExecutorError::NotFound(task_guid.to_string())),
            _ => Err(unexpected(response).await),
        }
    }
}
