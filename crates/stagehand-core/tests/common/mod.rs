// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for stagehand-core integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use stagehand_core::config::{BackendConfig, DEFAULT_TASK_DOMAIN};
use stagehand_core::{
    BackendRegistry, RegistryResolver, Sanitizer, StagingEngine, StagingRequest,
    StaticRegistryResolver,
};

pub const STAGING_GUID: &str = "staging-guid-1";

/// Builder configuration with the rabbit_hole stack and docker lifecycle mapped.
pub fn test_config() -> BackendConfig {
    BackendConfig {
        stager_url: "http://stager.example.com:8888".to_string(),
        file_server_url: "http://file-server.example.com:8080".to_string(),
        cc_uploader_url: "http://cc-uploader.example.com:9090".to_string(),
        ..BackendConfig::default()
    }
    .with_lifecycle("buildpack/rabbit_hole", "rabbit-hole-compiler")
    .with_lifecycle("docker", "docker_app_lifecycle/docker_app_lifecycle.tgz")
}

pub fn engine_with(
    config: BackendConfig,
    resolver: Arc<dyn RegistryResolver>,
    sanitizer: Arc<dyn Sanitizer>,
) -> StagingEngine {
    let domain = config.task_domain.clone();
    StagingEngine::new(BackendRegistry::standard(config, resolver), domain, sanitizer)
}

/// Engine over [`test_config`] with no registry and a pass-through sanitizer.
pub fn engine() -> StagingEngine {
    engine_with(
        test_config(),
        Arc::new(StaticRegistryResolver::empty()),
        Arc::new(|s: &str| s.to_string()),
    )
}

pub fn buildpack(name: &str, key: &str, skip_detect: bool) -> Value {
    json!({
        "name": name,
        "key": key,
        "url": format!("http://buildpacks.example.com/{}.zip", key),
        "skip_detect": skip_detect,
    })
}

/// Buildpack request for app "bunny" on the rabbit_hole stack.
pub fn buildpack_request(buildpacks: Vec<Value>) -> StagingRequest {
    StagingRequest {
        app_id: "bunny".to_string(),
        lifecycle: "buildpack".to_string(),
        lifecycle_data: Some(json!({
            "app_bits_download_uri": "http://x/bunny",
            "buildpacks": buildpacks,
            "droplet_upload_uri": "http://cc.example.com/v3/droplets/d1/upload",
            "stack": "rabbit_hole",
        })),
        memory_mb: 2048,
        disk_mb: 10240,
        file_descriptors: 512,
        timeout: 900,
        ..StagingRequest::default()
    }
}

/// Docker request for app "bunny".
pub fn docker_request(cache_docker_image: bool) -> StagingRequest {
    StagingRequest {
        app_id: "bunny".to_string(),
        lifecycle: "docker".to_string(),
        lifecycle_data: Some(json!({
            "docker_image": "docker:///diego/image",
            "cache_docker_image": cache_docker_image,
        })),
        memory_mb: 1024,
        disk_mb: 6144,
        file_descriptors: 512,
        timeout: 900,
        ..StagingRequest::default()
    }
}

pub fn default_domain() -> &'static str {
    DEFAULT_TASK_DOMAIN
}
