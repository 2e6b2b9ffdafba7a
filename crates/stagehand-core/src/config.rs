// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration shared by the recipe builders.

use std::collections::BTreeMap;
use std::time::Duration;

/// Default staging timeout when a request asks for none (15 minutes).
pub const DEFAULT_STAGING_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default workload domain for staging tasks.
pub const DEFAULT_TASK_DOMAIN: &str = "cf-app-staging";

/// Lifecycle bundle key for docker staging.
pub const DOCKER_LIFECYCLE_KEY: &str = "docker";

/// Configuration for the recipe builders.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Workload domain stamped on every staging task
    pub task_domain: String,
    /// Base URL of this service, used to build completion callback URLs
    pub stager_url: String,
    /// Base URL of the file server hosting lifecycle bundles
    pub file_server_url: String,
    /// Base URL of the uploader that proxies droplet and cache uploads
    pub cc_uploader_url: String,
    /// Lifecycle bundle locations keyed by `buildpack/<stack>` or `docker`
    pub lifecycles: BTreeMap<String, String>,
    /// Pass `-skipCertVerify=true` to the buildpack builder
    pub skip_cert_verify: bool,
    /// Treat the platform registry as insecure when caching images
    pub insecure_docker_registry: bool,
    /// Extra registries the docker builder may reach without TLS
    pub insecure_docker_registries: Vec<String>,
    /// Logical name of the platform image registry
    pub docker_registry_name: String,
    /// Stack used as root filesystem for docker staging
    pub docker_stack: String,
    /// Timeout used when a request asks for none
    pub default_timeout: Duration,
    /// Memory floor in MB
    pub min_memory_mb: u64,
    /// Disk floor in MB
    pub min_disk_mb: u64,
    /// File descriptor floor, applied only to non-zero requests
    pub min_file_descriptors: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            task_domain: DEFAULT_TASK_DOMAIN.to_string(),
            stager_url: "http://stager.service.cf.internal:8888".to_string(),
            file_server_url: "http://file-server.service.cf.internal:8080".to_string(),
            cc_uploader_url: "http://cc-uploader.service.cf.internal:9090".to_string(),
            lifecycles: BTreeMap::new(),
            skip_cert_verify: false,
            insecure_docker_registry: false,
            insecure_docker_registries: Vec::new(),
            docker_registry_name: "docker-registry.service.cf.internal".to_string(),
            docker_stack: "cflinuxfs3".to_string(),
            default_timeout: DEFAULT_STAGING_TIMEOUT,
            min_memory_mb: 1024,
            min_disk_mb: 6144,
            min_file_descriptors: 256,
        }
    }
}

impl BackendConfig {
    /// Completion callback URL for a staging task.
    pub fn completion_callback_url(&self, staging_guid: &str) -> String {
        format!(
            "{}/v1/staging/{}/completed",
            self.stager_url.trim_end_matches('/'),
            staging_guid
        )
    }

    /// Register a lifecycle bundle location.
    pub fn with_lifecycle(mut self, key: impl Into<String>, location: impl Into<String>) -> Self {
        self.lifecycles.insert(key.into(), location.into());
        self
    }
}
