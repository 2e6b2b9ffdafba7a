// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Docker image staging recipe.
//!
//! The builder inspects the image and writes its metadata. When the request
//! opts into image caching, the builder also pushes the image to the platform
//! registry, which needs a privileged run and egress to every registry address.

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    Backend, STAGING_USER, TASK_LOG_SOURCE, log_guid, parse_builder_output, parse_lifecycle_data,
};
use crate::action::{self, Action, DownloadAction, RunAction, emit_progress, serial};
use crate::annotation;
use crate::config::{BackendConfig, DOCKER_LIFECYCLE_KEY};
use crate::error::{Result, StagingError};
use crate::models::{
    DockerLifecycleMetadata, DockerStagingData, Lifecycle, LifecycleMetadata, SecurityGroupRule,
    StagingRequest, StagingResult, TaskCompletion, TaskDefinition,
};
use crate::registry::{RegistryEndpoints, RegistryResolver};
use crate::resources::{ResourcePlan, STAGING_TASK_CPU_WEIGHT};
use crate::urls;

const LIFECYCLE_DIR: &str = "/tmp/docker_app_lifecycle";
const BUILDER_PATH: &str = "/tmp/docker_app_lifecycle/builder";
const OUTPUT_METADATA: &str = "/tmp/docker-result/result.json";
const LIFECYCLE_CACHE_KEY: &str = "docker-lifecycle";

/// Builds docker staging tasks.
pub struct DockerBackend {
    config: BackendConfig,
    resolver: Arc<dyn RegistryResolver>,
}

impl DockerBackend {
    /// Create a new docker backend resolving registries through `resolver`.
    pub fn new(config: BackendConfig, resolver: Arc<dyn RegistryResolver>) -> Self {
        Self { config, resolver }
    }

    /// Resolve the platform registry, failing when it has no addresses.
    fn registry_endpoints(&self) -> Result<RegistryEndpoints> {
        let registry = &self.config.docker_registry_name;
        let endpoints = self.resolver.resolve(registry);
        if endpoints.addresses.is_empty() {
            return Err(StagingError::NoRegistryAvailable {
                registry: registry.clone(),
            });
        }
        Ok(endpoints)
    }

    /// Caching arguments for a resolved registry.
    fn caching_args(&self, endpoints: &RegistryEndpoints) -> Vec<String> {
        let mut args = vec![
            "-cacheDockerImage".to_string(),
            "-dockerRegistryHost".to_string(),
            self.config.docker_registry_name.clone(),
            "-dockerRegistryPort".to_string(),
            endpoints.port.to_string(),
            "-dockerRegistryIPs".to_string(),
            endpoints.addresses.join(","),
        ];

        let mut insecure = self.config.insecure_docker_registries.clone();
        if self.config.insecure_docker_registry {
            insecure.extend(endpoints.host_ports());
        }
        if !insecure.is_empty() {
            args.push("-insecureDockerRegistries".to_string());
            args.push(insecure.join(","));
        }
        args
    }
}

/// Credential arguments for whichever fields were supplied.
fn credential_args(data: &DockerStagingData) -> Vec<String> {
    let mut args = Vec::new();
    let fields = [
        ("-dockerLoginServer", &data.docker_login_server),
        ("-dockerUser", &data.docker_user),
        ("-dockerPassword", &data.docker_password),
        ("-dockerEmail", &data.docker_email),
    ];
    for (flag, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            args.push(flag.to_string());
            args.push(value.to_string());
        }
    }
    args
}

impl Backend for DockerBackend {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::Docker
    }

    fn build_recipe(
        &self,
        staging_guid: &str,
        request: &StagingRequest,
    ) -> Result<TaskDefinition> {
        if request.app_id.is_empty() {
            return Err(StagingError::MissingAppId);
        }
        let data: DockerStagingData = parse_lifecycle_data(Lifecycle::Docker, request)?;
        if data.docker_image.is_empty() {
            return Err(StagingError::MissingDockerImage);
        }

        let location = self
            .config
            .lifecycles
            .get(DOCKER_LIFECYCLE_KEY)
            .ok_or_else(|| StagingError::NoLifecycleBundle {
                key: DOCKER_LIFECYCLE_KEY.to_string(),
            })?;
        let lifecycle_url = urls::resolve_lifecycle_location(&self.config.file_server_url, location)?;

        let plan = ResourcePlan::for_request(request, &self.config);

        let mut args = vec![
            "-outputMetadataJSONFilename".to_string(),
            OUTPUT_METADATA.to_string(),
            "-dockerRef".to_string(),
            data.docker_image.clone(),
        ];
        args.extend(credential_args(&data));

        let mut egress_rules = request.egress_rules.clone();
        let mut privileged_run = false;
        if data.cache_docker_image {
            let endpoints = self.registry_endpoints()?;
            args.extend(self.caching_args(&endpoints));
            egress_rules.extend(
                endpoints
                    .addresses
                    .iter()
                    .map(|address| SecurityGroupRule::tcp(address.clone(), endpoints.port)),
            );
            privileged_run = true;
        }

        info!(
            staging_guid = %staging_guid,
            app_id = %request.app_id,
            docker_image = %data.docker_image,
            cache_docker_image = data.cache_docker_image,
            "Building docker staging recipe"
        );

        let actions = vec![
            emit_progress(
                Action::Download(DownloadAction {
                    artifact: "docker lifecycle".to_string(),
                    from: lifecycle_url,
                    to: LIFECYCLE_DIR.to_string(),
                    cache_key: Some(LIFECYCLE_CACHE_KEY.to_string()),
                    user: STAGING_USER.to_string(),
                }),
                "",
                "",
                "Failed to set up docker environment",
            ),
            emit_progress(
                Action::Run(RunAction {
                    path: BUILDER_PATH.to_string(),
                    args,
                    env: request.environment.clone(),
                    resource_limits: plan.resource_limits.clone(),
                    user: STAGING_USER.to_string(),
                    privileged: privileged_run,
                }),
                "Staging...",
                "Staging Complete",
                "Staging failed",
            ),
        ];

        debug!(
            staging_guid = %staging_guid,
            egress_rules = egress_rules.len(),
            "Docker recipe built"
        );

        Ok(TaskDefinition {
            task_guid: staging_guid.to_string(),
            domain: self.config.task_domain.clone(),
            root_fs: format!("preloaded:{}", self.config.docker_stack),
            memory_mb: plan.memory_mb,
            disk_mb: plan.disk_mb,
            cpu_weight: STAGING_TASK_CPU_WEIGHT,
            timeout_ms: action::duration_ms(plan.timeout),
            completion_callback_url: self.config.completion_callback_url(staging_guid),
            annotation: annotation::encode(Lifecycle::Docker),
            log_guid: log_guid(request),
            log_source: TASK_LOG_SOURCE.to_string(),
            result_file: OUTPUT_METADATA.to_string(),
            privileged: false,
            egress_rules,
            action: action::timeout(serial(actions), plan.timeout),
        })
    }

    fn build_staging_result(&self, completion: &TaskCompletion) -> Result<StagingResult> {
        let output = parse_builder_output::<DockerLifecycleMetadata>(completion)?;
        Ok(StagingResult {
            lifecycle_type: Lifecycle::Docker,
            lifecycle_metadata: LifecycleMetadata::Docker(output.lifecycle_metadata),
            process_types: output.process_types,
            execution_metadata: output.execution_metadata,
        })
    }
}
