// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Outcome delivery to the requester.

use std::time::Duration;

use async_trait::async_trait;
use stagehand_core::{DeliveryError, is_retryable};
use tracing::{error, info, warn};

/// Delivers staging outcomes.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the serialized outcome of `staging_guid`.
    async fn deliver(&self, staging_guid: &str, payload: &[u8]) -> Result<(), DeliveryError>;
}

/// Notifier posting outcomes to the requester's internal API.
pub struct HttpNotifier {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpNotifier {
    /// Create a notifier posting to `base_url` with basic auth.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// Completion URL for `staging_guid`.
    pub fn completion_url(&self, staging_guid: &str) -> String {
        format!(
            "{}/internal/v3/staging/{}/build_completed",
            self.base_url, staging_guid
        )
    }
}

fn transport_error(err: reqwest::Error) -> DeliveryError {
    DeliveryError::Transport {
        temporary: err.is_connect(),
        timeout: err.is_timeout(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn deliver(&self, staging_guid: &str, payload: &[u8]) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.completion_url(staging_guid))
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Bounded exponential backoff for outcome delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Default policy with `max_attempts` attempts.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.max_delay)
    }
}

/// Deliver `payload`, retrying failures [`is_retryable`] deems transient.
pub async fn deliver_with_retry(
    notifier: &dyn Notifier,
    staging_guid: &str,
    payload: &[u8],
    policy: &RetryPolicy,
) -> Result<(), DeliveryError> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match notifier.deliver(staging_guid, payload).await {
            Ok(()) => {
                info!(staging_guid = %staging_guid, attempt, "Staging outcome delivered");
                return Ok(());
            }
            Err(err) => err,
        };

        if is_retryable(&err) && attempt < policy.max_attempts {
            let delay = policy.backoff(attempt);
            warn!(
                staging_guid = %staging_guid,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Outcome delivery failed, retrying"
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        match &err {
            DeliveryError::Status { status, .. } => error!(
                staging_guid = %staging_guid,
                attempt,
                status,
                error = %err,
                "Giving up on outcome delivery"
            ),
            _ => error!(
                staging_guid = %staging_guid,
                attempt,
                error = %err,
                "Giving up on outcome delivery"
            ),
        }
        return Err(err);
    }
}
