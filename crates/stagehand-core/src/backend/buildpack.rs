// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Buildpack staging recipe.
//!
//! ```text
//! timeout
//! └── serial
//!     ├── download app bits
//!     ├── emit_progress "Downloading buildpacks (...)..."
//!     │   └── parallel
//!     │       ├── download builder
//!     │       ├── download buildpack (one per non-custom buildpack)
//!     │       └── try: download build artifacts cache   (if present)
//!     ├── emit_progress "Staging..."
//!     │   └── run builder
//!     └── emit_progress "Uploading droplet..."
//!         └── parallel
//!             ├── upload droplet
//!             └── try: upload build artifacts cache     (if present)
//! ```

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{
    Backend, STAGING_USER, TASK_LOG_SOURCE, log_guid, parse_builder_output, parse_lifecycle_data,
};
use crate::action::{
    self, Action, DownloadAction, RunAction, UploadAction, emit_progress, parallel, serial,
    try_action,
};
use crate::annotation;
use crate::config::BackendConfig;
use crate::error::{Result, StagingError};
use crate::models::{
    Buildpack, BuildpackLifecycleMetadata, BuildpackStagingData, Lifecycle, LifecycleMetadata,
    StagingRequest, StagingResult, TaskCompletion, TaskDefinition,
};
use crate::resources::{ResourcePlan, STAGING_TASK_CPU_WEIGHT};
use crate::urls;

const LIFECYCLE_DIR: &str = "/tmp/lifecycle";
const BUILDER_PATH: &str = "/tmp/lifecycle/builder";
const APP_DIR: &str = "/tmp/app";
const BUILD_ARTIFACTS_CACHE_DIR: &str = "/tmp/cache";
const OUTPUT_BUILD_ARTIFACTS_CACHE: &str = "/tmp/output-cache";
const BUILDPACKS_DIR: &str = "/tmp/buildpacks";
const OUTPUT_DROPLET: &str = "/tmp/droplet";
const OUTPUT_METADATA: &str = "/tmp/result.json";

const FETCHING_STANDARD_BUILDPACKS: &str =
    "No buildpack specified; fetching standard buildpacks to detect and build your application.\n";

/// Builds buildpack staging tasks.
pub struct BuildpackBackend {
    config: BackendConfig,
}

impl BuildpackBackend {
    /// Create a new buildpack backend.
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    /// Download URL of the builder bundle for `stack`.
    fn lifecycle_download_url(&self, stack: &str) -> Result<String> {
        let location = self
            .config
            .lifecycles
            .get(&format!("buildpack/{}", stack))
            .ok_or_else(|| StagingError::NoCompilerDefined {
                stack: stack.to_string(),
            })?;
        urls::resolve_lifecycle_location(&self.config.file_server_url, location)
    }
}

/// Whether the builder should skip detection for `buildpacks`.
pub fn skip_detect(buildpacks: &[Buildpack]) -> bool {
    matches!(buildpacks, [only] if only.skip_detect)
}

/// Detection order passed to the builder: buildpack keys in request order.
pub fn buildpack_order(buildpacks: &[Buildpack]) -> String {
    buildpacks
        .iter()
        .map(|bp| bp.key.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Directory a buildpack is downloaded to.
///
/// Derived from the cache key only, so restaging reuses the same path.
pub fn buildpack_dir(key: &str) -> String {
    format!("{}/{:x}", BUILDPACKS_DIR, Sha256::digest(key.as_bytes()))
}

/// Start message of the download step.
pub fn download_message(buildpacks: &[Buildpack], with_cache: bool) -> String {
    let names: Vec<&str> = buildpacks
        .iter()
        .map(|bp| {
            if bp.is_custom() {
                bp.url.as_str()
            } else if bp.name.is_empty() {
                bp.key.as_str()
            } else {
                bp.name.as_str()
            }
        })
        .collect();

    let mut message = String::new();
    if !skip_detect(buildpacks) {
        message.push_str(FETCHING_STANDARD_BUILDPACKS);
    }
    message.push_str(&format!("Downloading buildpacks ({})", names.join(", ")));
    if with_cache {
        message.push_str(", build artifacts cache");
    }
    message.push_str("...");
    message
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Backend for BuildpackBackend {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::Buildpack
    }

    fn build_recipe(
        &self,
        staging_guid: &str,
        request: &StagingRequest,
    ) -> Result<TaskDefinition> {
        if request.app_id.is_empty() {
            return Err(StagingError::MissingAppId);
        }
        let data: BuildpackStagingData = parse_lifecycle_data(Lifecycle::Buildpack, request)?;
        if data.app_bits_download_uri.is_empty() {
            return Err(StagingError::MissingAppBitsDownloadUri);
        }

        let lifecycle_url = self.lifecycle_download_url(&data.stack)?;
        urls::validate("app bits download", &data.app_bits_download_uri)?;
        let cache_download_uri = non_empty(&data.build_artifacts_cache_download_uri);
        if let Some(uri) = cache_download_uri {
            urls::validate("build artifacts cache download", uri)?;
        }
        if data.droplet_upload_uri.is_empty() {
            return Err(StagingError::MissingDropletUploadUri);
        }

        let plan = ResourcePlan::for_request(request, &self.config);
        let skip_detect = skip_detect(&data.buildpacks);

        info!(
            staging_guid = %staging_guid,
            app_id = %request.app_id,
            stack = %data.stack,
            buildpacks = data.buildpacks.len(),
            skip_detect,
            "Building buildpack staging recipe"
        );

        let mut actions = Vec::with_capacity(4);

        // App bits
        actions.push(Action::Download(DownloadAction {
            artifact: String::new(),
            from: data.app_bits_download_uri.clone(),
            to: APP_DIR.to_string(),
            cache_key: None,
            user: STAGING_USER.to_string(),
        }));

        // Builder, buildpacks and cache
        let mut downloads = vec![Action::Download(DownloadAction {
            artifact: String::new(),
            from: lifecycle_url,
            to: LIFECYCLE_DIR.to_string(),
            cache_key: Some(format!("buildpack-{}-lifecycle", data.stack)),
            user: STAGING_USER.to_string(),
        })];
        for buildpack in data.buildpacks.iter().filter(|bp| !bp.is_custom()) {
            downloads.push(Action::Download(DownloadAction {
                artifact: buildpack.name.clone(),
                from: buildpack.url.clone(),
                to: buildpack_dir(&buildpack.key),
                cache_key: Some(buildpack.key.clone()),
                user: STAGING_USER.to_string(),
            }));
        }
        if let Some(uri) = cache_download_uri {
            downloads.push(try_action(Action::Download(DownloadAction {
                artifact: "build artifacts cache".to_string(),
                from: uri.to_string(),
                to: BUILD_ARTIFACTS_CACHE_DIR.to_string(),
                cache_key: None,
                user: STAGING_USER.to_string(),
            })));
        }
        actions.push(emit_progress(
            parallel(downloads),
            download_message(&data.buildpacks, cache_download_uri.is_some()),
            "Downloaded buildpacks",
            "Downloading buildpacks failed",
        ));

        // Builder run
        let args = vec![
            format!("-buildArtifactsCacheDir={}", BUILD_ARTIFACTS_CACHE_DIR),
            format!("-buildDir={}", APP_DIR),
            format!("-buildpackOrder={}", buildpack_order(&data.buildpacks)),
            format!("-buildpacksDir={}", BUILDPACKS_DIR),
            format!("-outputBuildArtifactsCache={}", OUTPUT_BUILD_ARTIFACTS_CACHE),
            format!("-outputDroplet={}", OUTPUT_DROPLET),
            format!("-outputMetadata={}", OUTPUT_METADATA),
            format!("-skipCertVerify={}", self.config.skip_cert_verify),
            format!("-skipDetect={}", skip_detect),
        ];
        actions.push(emit_progress(
            Action::Run(RunAction {
                path: BUILDER_PATH.to_string(),
                args,
                env: request.environment.clone(),
                resource_limits: plan.resource_limits.clone(),
                user: STAGING_USER.to_string(),
                privileged: false,
            }),
            "Staging...",
            "Staging complete",
            "Staging failed",
        ));

        // Droplet and cache
        let mut uploads = vec![Action::Upload(UploadAction {
            artifact: "droplet".to_string(),
            from: OUTPUT_DROPLET.to_string(),
            to: urls::droplet_upload_url(
                &self.config.cc_uploader_url,
                staging_guid,
                &data.droplet_upload_uri,
                plan.timeout,
            )?,
            user: STAGING_USER.to_string(),
        })];
        let mut upload_message = "Uploading droplet".to_string();
        if let Some(uri) = non_empty(&data.build_artifacts_cache_upload_uri) {
            uploads.push(try_action(Action::Upload(UploadAction {
                artifact: "build artifacts cache".to_string(),
                from: OUTPUT_BUILD_ARTIFACTS_CACHE.to_string(),
                to: urls::build_artifacts_upload_url(
                    &self.config.cc_uploader_url,
                    staging_guid,
                    uri,
                    plan.timeout,
                )?,
                user: STAGING_USER.to_string(),
            })));
            upload_message.push_str(", build artifacts cache");
        }
        upload_message.push_str("...");
        actions.push(emit_progress(
            parallel(uploads),
            upload_message,
            "Uploading complete",
            "Uploading failed",
        ));

        debug!(staging_guid = %staging_guid, disk_mb = plan.disk_mb, "Buildpack recipe built");

        Ok(TaskDefinition {
            task_guid: staging_guid.to_string(),
            domain: self.config.task_domain.clone(),
            root_fs: format!("preloaded:{}", data.stack),
            memory_mb: plan.memory_mb,
            disk_mb: plan.disk_mb,
            cpu_weight: STAGING_TASK_CPU_WEIGHT,
            timeout_ms: action::duration_ms(plan.timeout),
            completion_callback_url: self.config.completion_callback_url(staging_guid),
            annotation: annotation::encode(Lifecycle::Buildpack),
            log_guid: log_guid(request),
            log_source: TASK_LOG_SOURCE.to_string(),
            result_file: OUTPUT_METADATA.to_string(),
            privileged: true,
            egress_rules: request.egress_rules.clone(),
            action: action::timeout(serial(actions), plan.timeout),
        })
    }

    fn build_staging_result(&self, completion: &TaskCompletion) -> Result<StagingResult> {
        let output = parse_builder_output::<BuildpackLifecycleMetadata>(completion)?;
        Ok(StagingResult {
            lifecycle_type: Lifecycle::Buildpack,
            lifecycle_metadata: LifecycleMetadata::Buildpack(output.lifecycle_metadata),
            process_types: output.process_types,
            execution_metadata: output.execution_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(name: &str, key: &str, skip_detect: bool) -> Buildpack {
        Buildpack {
            name: name.to_string(),
            key: key.to_string(),
            url: format!("http://example.com/{}.zip", key),
            skip_detect,
        }
    }

    #[test]
    fn test_skip_detect_only_for_single_flagged_buildpack() {
        assert!(skip_detect(&[bp("a", "a", true)]));
        assert!(!skip_detect(&[bp("a", "a", false)]));
        assert!(!skip_detect(&[bp("a", "a", true), bp("b", "b", true)]));
        assert!(!skip_detect(&[]));
    }

    #[test]
    fn test_buildpack_order_preserves_request_order() {
        let order = buildpack_order(&[
            bp("z", "zfirst", false),
            bp("a", "asecond", false),
            bp("m", "mthird", false),
        ]);
        assert_eq!(order, "zfirst,asecond,mthird");
    }

    #[test]
    fn test_buildpack_dir_is_stable_per_key() {
        assert_eq!(buildpack_dir("zfirst"), buildpack_dir("zfirst"));
        assert_ne!(buildpack_dir("zfirst"), buildpack_dir("asecond"));
        assert!(buildpack_dir("zfirst").starts_with("/tmp/buildpacks/"));
        // sha256 hex
        assert_eq!(buildpack_dir("zfirst").len(), "/tmp/buildpacks/".len() + 64);
    }

    #[test]
    fn test_download_message_with_detection() {
        let message = download_message(&[bp("zfirst", "z", false), bp("asecond", "a", false)], true);
        assert_eq!(
            message,
            format!(
                "{}Downloading buildpacks (zfirst, asecond), build artifacts cache...",
                FETCHING_STANDARD_BUILDPACKS
            )
        );
    }

    #[test]
    fn test_download_message_skipping_detection() {
        let mut custom = bp("custom", "http://example.com/bp.zip", true);
        custom.url = "http://example.com/bp.zip".to_string();
        let message = download_message(&[custom], false);
        assert_eq!(message, "Downloading buildpacks (http://example.com/bp.zip)...");
    }
}
