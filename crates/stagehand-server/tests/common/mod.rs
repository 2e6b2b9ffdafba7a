// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for stagehand-server tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use stagehand_core::config::BackendConfig;
use stagehand_core::{
    BackendRegistry, DeliveryError, StagingEngine, StagingRequest, StagingResponse,
    StaticRegistryResolver,
};
use stagehand_server::executor::MockExecutor;
use stagehand_server::handlers::StagerHandlerState;
use stagehand_server::notifier::{Notifier, RetryPolicy};
use tokio::sync::Mutex;

/// Notifier that records deliveries in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
    /// Statuses returned for the first deliveries, in order; afterwards success
    pub failures: Mutex<Vec<u16>>,
}

impl RecordingNotifier {
    pub fn failing_with(statuses: Vec<u16>) -> Self {
        Self {
            failures: Mutex::new(statuses),
            ..Self::default()
        }
    }

    /// Outcomes delivered so far, decoded.
    pub async fn outcomes(&self) -> Vec<(String, StagingResponse)> {
        self.deliveries
            .lock()
            .await
            .iter()
            .map(|(guid, payload)| (guid.clone(), serde_json::from_slice(payload).unwrap()))
            .collect()
    }

    pub async fn attempts(&self) -> usize {
        self.deliveries.lock().await.len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, staging_guid: &str, payload: &[u8]) -> Result<(), DeliveryError> {
        self.deliveries
            .lock()
            .await
            .push((staging_guid.to_string(), payload.to_vec()));

        let mut failures = self.failures.lock().await;
        if failures.is_empty() {
            return Ok(());
        }
        Err(DeliveryError::Status {
            status: failures.remove(0),
            body: String::new(),
        })
    }
}

pub fn test_engine() -> StagingEngine {
    let config = BackendConfig {
        stager_url: "http://stager.example.com:8888".to_string(),
        ..BackendConfig::default()
    }
    .with_lifecycle("buildpack/rabbit_hole", "rabbit-hole-compiler")
    .with_lifecycle("docker", "docker_app_lifecycle.tgz");
    let domain = config.task_domain.clone();
    StagingEngine::new(
        BackendRegistry::standard(config, Arc::new(StaticRegistryResolver::empty())),
        domain,
        Arc::new(|s: &str| format!("{}!", s)),
    )
}

/// Handler state over a mock executor and a recording notifier, with fast retries.
pub fn create_test_state(
    executor: Arc<MockExecutor>,
    notifier: Arc<RecordingNotifier>,
) -> StagerHandlerState {
    StagerHandlerState::new(Arc::new(test_engine()), executor, notifier).with_retry_policy(
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
    )
}

pub fn buildpack_request_json() -> Value {
    json!({
        "app_id": "bunny",
        "lifecycle": "buildpack",
        "lifecycle_data": {
            "app_bits_download_uri": "http://x/bunny",
            "buildpacks": [
                { "name": "zfirst", "key": "zfirst", "url": "http://bp.example.com/z.zip" },
                { "name": "asecond", "key": "asecond", "url": "http://bp.example.com/a.zip" }
            ],
            "droplet_upload_uri": "http://cc.example.com/droplet",
            "stack": "rabbit_hole"
        },
        "memory_mb": 1024,
        "disk_mb": 6144,
        "file_descriptors": 256,
        "timeout": 900
    })
}

pub fn buildpack_request() -> StagingRequest {
    serde_json::from_value(buildpack_request_json()).unwrap()
}
