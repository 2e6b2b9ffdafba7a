// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Resource and timeout policy for staging tasks.

use std::time::Duration;

use tracing::warn;

use crate::action::ResourceLimits;
use crate::config::BackendConfig;
use crate::models::StagingRequest;

/// CPU weight given to every staging task.
pub const STAGING_TASK_CPU_WEIGHT: u32 = 50;

/// Disk added on top of the app's quota for staging scratch space
/// (buildpacks, caches and the droplet live next to the app).
pub const STAGING_DISK_OVERHEAD_MB: u64 = 1024;

/// Raise `requested` to `floor`.
pub fn effective_limit(requested: u64, floor: u64) -> u64 {
    requested.max(floor)
}

/// Resolved limits for one staging task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePlan {
    /// Memory limit in MB
    pub memory_mb: u64,
    /// Disk limit in MB, including staging overhead
    pub disk_mb: u64,
    /// Run action limits; `None` when the request asked for no fd limit
    pub resource_limits: Option<ResourceLimits>,
    /// Total staging timeout
    pub timeout: Duration,
}

impl ResourcePlan {
    /// Resolve the limits for `request` under `config`.
    pub fn for_request(request: &StagingRequest, config: &BackendConfig) -> Self {
        Self {
            memory_mb: effective_limit(request.memory_mb, config.min_memory_mb),
            disk_mb: effective_limit(request.disk_mb, config.min_disk_mb)
                .saturating_add(STAGING_DISK_OVERHEAD_MB),
            resource_limits: file_descriptor_limits(
                request.file_descriptors,
                config.min_file_descriptors,
            ),
            timeout: staging_timeout(&request.app_id, request.timeout, config.default_timeout),
        }
    }
}

/// File descriptor limits for the run action.
///
/// A request of 0 means no limit at all; anything else is raised to `floor`.
pub fn file_descriptor_limits(requested: u64, floor: u64) -> Option<ResourceLimits> {
    if requested == 0 {
        return None;
    }
    Some(ResourceLimits {
        nofile: Some(effective_limit(requested, floor)),
    })
}

/// Staging timeout for a request asking for `requested_secs`.
pub fn staging_timeout(app_id: &str, requested_secs: i64, default: Duration) -> Duration {
    if requested_secs > 0 {
        return Duration::from_secs(requested_secs as u64);
    }

    warn!(
        app_id = %app_id,
        requested_secs,
        default_secs = default.as_secs(),
        "Requested staging timeout not positive, using default"
    );
    default
}
