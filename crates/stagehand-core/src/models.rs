// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request, envelope and response types.
//!
//! Field names are part of the wire contract with the requester and the
//! executor. Do not rename without versioning the API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::StagingError;

// ============================================================================
// Shared Types
// ============================================================================

/// Staging strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Compile application source with buildpacks into a droplet
    Buildpack,
    /// Validate a container image and extract its start metadata
    Docker,
}

impl Lifecycle {
    /// Wire name of this lifecycle.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buildpack => "buildpack",
            Self::Docker => "docker",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifecycle {
    type Err = StagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buildpack" => Ok(Self::Buildpack),
            "docker" => Ok(Self::Docker),
            other => Err(StagingError::UnknownLifecycle(other.to_string())),
        }
    }
}

/// A single environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    /// Variable name
    pub name: String,
    /// Variable value
    pub value: String,
}

impl EnvironmentVariable {
    /// Create a new variable.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Port range for an egress rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    /// First port, inclusive
    pub start: u16,
    /// Last port, inclusive
    pub end: u16,
}

/// Egress rule attached to the staging container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    /// Protocol: "tcp", "udp", "icmp" or "all"
    pub protocol: String,
    /// Destination addresses or CIDRs
    pub destinations: Vec<String>,
    /// Individual destination ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
    /// Destination port range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<PortRange>,
    /// Whether matching traffic is logged
    #[serde(default)]
    pub log: bool,
}

impl SecurityGroupRule {
    /// TCP rule towards a single destination and port.
    pub fn tcp(destination: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: "tcp".to_string(),
            destinations: vec![destination.into()],
            ports: vec![port],
            port_range: None,
            log: false,
        }
    }
}

// ============================================================================
// Staging Request
// ============================================================================

/// Inbound staging request.
///
/// `lifecycle_data` stays raw JSON until the backend for `lifecycle` parses it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagingRequest {
    /// Application id
    #[serde(default)]
    pub app_id: String,
    /// Lifecycle name ("buildpack" or "docker")
    #[serde(default)]
    pub lifecycle: String,
    /// Lifecycle-specific payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_data: Option<serde_json::Value>,
    /// Requested memory in MB
    #[serde(default)]
    pub memory_mb: u64,
    /// Requested disk in MB
    #[serde(default)]
    pub disk_mb: u64,
    /// Requested file descriptor limit; 0 means unlimited
    #[serde(default)]
    pub file_descriptors: u64,
    /// Requested timeout in seconds; 0 or less means the configured default
    #[serde(default)]
    pub timeout: i64,
    /// Egress rules for the staging container
    #[serde(default)]
    pub egress_rules: Vec<SecurityGroupRule>,
    /// Environment passed to the builder, in order
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
    /// Log routing tag; falls back to app_id
    #[serde(default)]
    pub log_guid: String,
}

/// A buildpack offered to the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buildpack {
    /// Display name; "custom" marks a buildpack referenced by URL
    #[serde(default)]
    pub name: String,
    /// Stable cache key
    pub key: String,
    /// Source URL
    #[serde(default)]
    pub url: String,
    /// Use exactly this buildpack without detection
    #[serde(default)]
    pub skip_detect: bool,
}

impl Buildpack {
    /// Name used for buildpacks referenced directly by URL.
    pub const CUSTOM: &'static str = "custom";

    /// Whether the builder fetches this buildpack itself.
    pub fn is_custom(&self) -> bool {
        self.name == Self::CUSTOM
    }
}

/// Lifecycle data for buildpack staging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackStagingData {
    /// Application source download URI
    #[serde(default)]
    pub app_bits_download_uri: String,
    /// Previous build artifacts cache; absent means no restore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_artifacts_cache_download_uri: Option<String>,
    /// Where to upload the new build artifacts cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_artifacts_cache_upload_uri: Option<String>,
    /// Buildpacks in detection order
    #[serde(default)]
    pub buildpacks: Vec<Buildpack>,
    /// Where to upload the droplet
    #[serde(default)]
    pub droplet_upload_uri: String,
    /// Target stack
    #[serde(default)]
    pub stack: String,
}

/// Lifecycle data for docker staging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerStagingData {
    /// Image reference
    #[serde(default)]
    pub docker_image: String,
    /// Registry to log in to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_login_server: Option<String>,
    /// Registry user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_user: Option<String>,
    /// Registry password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_password: Option<String>,
    /// Registry email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_email: Option<String>,
    /// Copy the image into the platform registry while staging
    #[serde(default)]
    pub cache_docker_image: bool,
}

// ============================================================================
// Task Envelope
// ============================================================================

/// Task submitted to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task identifier; equals the staging guid
    pub task_guid: String,
    /// Workload domain
    pub domain: String,
    /// Root filesystem selector
    pub root_fs: String,
    /// Memory limit in MB
    pub memory_mb: u64,
    /// Disk limit in MB
    pub disk_mb: u64,
    /// CPU weight
    pub cpu_weight: u32,
    /// Total wall-clock timeout in milliseconds
    pub timeout_ms: u64,
    /// Where the executor reports completion
    pub completion_callback_url: String,
    /// Opaque metadata echoed back on completion
    pub annotation: String,
    /// Log routing tag
    pub log_guid: String,
    /// Log source label
    pub log_source: String,
    /// File whose contents become the task result
    pub result_file: String,
    /// Whether the container needs elevated privileges
    pub privileged: bool,
    /// Egress rules for the container
    #[serde(default)]
    pub egress_rules: Vec<SecurityGroupRule>,
    /// Root action
    pub action: Action,
}

// ============================================================================
// Completion
// ============================================================================

/// Completion event reported by the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletion {
    /// Task identifier
    pub task_guid: String,
    /// Workload domain
    #[serde(default)]
    pub domain: String,
    /// Whether the task failed
    #[serde(default)]
    pub failed: bool,
    /// Failure reason, set when failed
    #[serde(default)]
    pub failure_reason: String,
    /// Contents of the result file, set when not failed
    #[serde(default)]
    pub result: String,
    /// Annotation as submitted
    #[serde(default)]
    pub annotation: String,
}

/// Sanitized failure sent back to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingFailure {
    /// Stable failure identifier
    pub id: String,
    /// Message safe to show to the requester
    pub message: String,
}

/// Metadata specific to the lifecycle that staged the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LifecycleMetadata {
    /// Buildpack staging metadata
    Buildpack(BuildpackLifecycleMetadata),
    /// Docker staging metadata
    Docker(DockerLifecycleMetadata),
}

/// Buildpack detected during staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackLifecycleMetadata {
    /// Cache key of the buildpack that compiled the app
    pub buildpack_key: String,
    /// Name reported by the buildpack's detect step
    pub detected_buildpack: String,
}

/// Image that was staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerLifecycleMetadata {
    /// Image reference
    pub docker_image: String,
}

/// Successful staging result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingResult {
    /// Lifecycle that produced this result
    pub lifecycle_type: Lifecycle,
    /// Lifecycle-specific metadata
    pub lifecycle_metadata: LifecycleMetadata,
    /// Detected start commands by process type
    pub process_types: BTreeMap<String, String>,
    /// Opaque execution metadata for the runtime
    pub execution_metadata: String,
}

/// Outcome delivered to the requester.
///
/// Serializes as `{"result": {...}}` or `{"error": {...}}`; never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingResponse {
    /// Staging succeeded
    Result(StagingResult),
    /// Staging failed
    Error(StagingFailure),
}

impl StagingResponse {
    /// The failure, if staging failed.
    pub fn error(&self) -> Option<&StagingFailure> {
        match self {
            Self::Error(failure) => Some(failure),
            Self::Result(_) => None,
        }
    }

    /// The result, if staging succeeded.
    pub fn result(&self) -> Option<&StagingResult> {
        match self {
            Self::Result(result) => Some(result),
            Self::Error(_) => None,
        }
    }
}
