// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Recipe builders, one per lifecycle.
//!
//! Backends are registered once at startup in a [`BackendRegistry`] keyed by
//! [`Lifecycle`] and handed to the engine explicitly.

pub mod buildpack;
pub mod docker;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::BackendConfig;
use crate::error::{Result, StagingError};
use crate::models::{Lifecycle, StagingRequest, StagingResult, TaskCompletion, TaskDefinition};
use crate::registry::RegistryResolver;

pub use buildpack::BuildpackBackend;
pub use docker::DockerBackend;

/// Log source stamped on staging tasks.
pub const TASK_LOG_SOURCE: &str = "STG";

/// User every staging action runs as.
pub const STAGING_USER: &str = "vcap";

/// Builds recipes for one lifecycle and interprets their results.
///
/// Backends are pure: no I/O, no shared mutable state.
pub trait Backend: Send + Sync {
    /// Lifecycle this backend handles.
    fn lifecycle(&self) -> Lifecycle;

    /// Build the task for `request`, identified by `staging_guid`.
    fn build_recipe(&self, staging_guid: &str, request: &StagingRequest)
    -> Result<TaskDefinition>;

    /// Interpret the result of a task this backend built that succeeded.
    fn build_staging_result(&self, completion: &TaskCompletion) -> Result<StagingResult>;
}

/// Backends keyed by lifecycle.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<Lifecycle, Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the buildpack and docker backends.
    pub fn standard(config: BackendConfig, resolver: Arc<dyn RegistryResolver>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BuildpackBackend::new(config.clone())));
        registry.register(Arc::new(DockerBackend::new(config, resolver)));
        registry
    }

    /// Register `backend`, replacing any backend for the same lifecycle.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.lifecycle(), backend);
    }

    /// Backend for `lifecycle`.
    pub fn get(&self, lifecycle: Lifecycle) -> Result<&dyn Backend> {
        self.backends
            .get(&lifecycle)
            .map(|b| b.as_ref())
            .ok_or_else(|| StagingError::UnknownLifecycle(lifecycle.to_string()))
    }

    /// Registered lifecycles.
    pub fn lifecycles(&self) -> Vec<Lifecycle> {
        let mut lifecycles: Vec<_> = self.backends.keys().copied().collect();
        lifecycles.sort();
        lifecycles
    }
}

/// Parse the request's lifecycle data for `lifecycle`.
pub(crate) fn parse_lifecycle_data<T: DeserializeOwned>(
    lifecycle: Lifecycle,
    request: &StagingRequest,
) -> Result<T> {
    let data = match &request.lifecycle_data {
        None | Some(serde_json::Value::Null) => {
            return Err(StagingError::MissingLifecycleData { lifecycle });
        }
        Some(data) => data.clone(),
    };

    serde_json::from_value(data).map_err(|e| StagingError::InvalidLifecycleData {
        lifecycle,
        message: e.to_string(),
    })
}

/// Result file written by both builders.
#[derive(Debug, Deserialize)]
pub(crate) struct BuilderOutput<M> {
    pub lifecycle_metadata: M,
    #[serde(default)]
    pub process_types: BTreeMap<String, String>,
    #[serde(default)]
    pub execution_metadata: String,
}

/// Parse the result file of a successful task.
pub(crate) fn parse_builder_output<M: DeserializeOwned>(
    completion: &TaskCompletion,
) -> Result<BuilderOutput<M>> {
    serde_json::from_str(&completion.result).map_err(|e| StagingError::ResultParse {
        task_guid: completion.task_guid.clone(),
        message: e.to_string(),
    })
}

/// Log guid for a request, falling back to the app id.
pub(crate) fn log_guid(request: &StagingRequest) -> String {
    if request.log_guid.is_empty() {
        request.app_id.clone()
    } else {
        request.log_guid.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistryResolver;
    use serde_json::json;

    #[test]
    fn test_standard_registry_has_both_lifecycles() {
        let registry = BackendRegistry::standard(
            BackendConfig::default(),
            Arc::new(StaticRegistryResolver::empty()),
        );
        assert_eq!(
            registry.lifecycles(),
            vec![Lifecycle::Buildpack, Lifecycle::Docker]
        );
        assert_eq!(
            registry.get(Lifecycle::Docker).unwrap().lifecycle(),
            Lifecycle::Docker
        );
    }

    #[test]
    fn test_empty_registry_reports_unknown_lifecycle() {
        let registry = BackendRegistry::new();
        assert!(matches!(
            registry.get(Lifecycle::Buildpack),
            Err(StagingError::UnknownLifecycle(_))
        ));
    }

    #[test]
    fn test_null_lifecycle_data_is_missing() {
        let request = StagingRequest {
            lifecycle_data: Some(serde_json::Value::Null),
            ..StagingRequest::default()
        };
        let err =
            parse_lifecycle_data::<serde_json::Value>(Lifecycle::Buildpack, &request).unwrap_err();
        assert!(matches!(err, StagingError::MissingLifecycleData { .. }));
    }

    #[test]
    fn test_log_guid_falls_back_to_app_id() {
        let request = StagingRequest {
            app_id: "bunny".to_string(),
            ..StagingRequest::default()
        };
        assert_eq!(log_guid(&request), "bunny");

        let request = StagingRequest {
            log_guid: "logs".to_string(),
            lifecycle_data: Some(json!({})),
            ..request
        };
        assert_eq!(log_guid(&request), "logs");
    }
}
