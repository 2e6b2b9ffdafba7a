// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for stagehand-server.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use stagehand_core::config::{BackendConfig, DEFAULT_TASK_DOMAIN};
use stagehand_core::registry::{DEFAULT_DOCKER_REGISTRY_PORT, StaticRegistryResolver};

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// Externally reachable base URL of this service (completion callbacks)
    pub stager_url: String,
    /// Base URL of the task executor API
    pub executor_url: String,
    /// Base URL of the requester's internal API
    pub cc_base_url: String,
    /// Basic auth user for outcome delivery
    pub cc_username: String,
    /// Basic auth password for outcome delivery
    pub cc_password: String,
    /// Base URL of the file server hosting lifecycle bundles
    pub file_server_url: String,
    /// Base URL of the droplet/cache uploader
    pub cc_uploader_url: String,
    /// Lifecycle bundle locations keyed by `buildpack/<stack>` or `docker`
    pub lifecycles: BTreeMap<String, String>,
    /// Workload domain for staging tasks
    pub task_domain: String,
    /// Skip TLS verification in the buildpack builder and executor client
    pub skip_cert_verify: bool,
    /// Treat the platform registry as insecure
    pub insecure_docker_registry: bool,
    /// Registries the docker builder may reach without TLS
    pub insecure_docker_registries: Vec<String>,
    /// Platform registry addresses used for image caching
    pub docker_registry_addresses: Vec<String>,
    /// Platform registry port
    pub docker_registry_port: u16,
    /// Root filesystem stack for docker staging
    pub docker_stack: String,
    /// Timeout used when a request asks for none
    pub default_timeout: Duration,
    /// Memory floor in MB
    pub min_memory_mb: u64,
    /// Disk floor in MB
    pub min_disk_mb: u64,
    /// File descriptor floor
    pub min_file_descriptors: u64,
    /// Maximum delivery attempts per outcome
    pub delivery_max_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnvVar(name))
        };
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let flag = |name: &str| {
            lookup(name)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };
        let list = |name: &str| split_list(&lookup(name).unwrap_or_default());

        let listen_addr = or_default("STAGER_LISTEN_ADDR", "0.0.0.0:8888");
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(listen_addr))?;

        let docker_registry_port: u16 = or_default(
            "STAGER_DOCKER_REGISTRY_PORT",
            &DEFAULT_DOCKER_REGISTRY_PORT.to_string(),
        )
        .parse()
        .map_err(|_| ConfigError::InvalidPort)?;

        Ok(Self {
            listen_addr,
            stager_url: required("STAGER_URL")?,
            executor_url: required("STAGER_EXECUTOR_URL")?,
            cc_base_url: required("STAGER_CC_BASE_URL")?,
            cc_username: or_default("STAGER_CC_USERNAME", ""),
            cc_password: or_default("STAGER_CC_PASSWORD", ""),
            file_server_url: required("STAGER_FILE_SERVER_URL")?,
            cc_uploader_url: required("STAGER_CC_UPLOADER_URL")?,
            lifecycles: parse_lifecycles(&or_default("STAGER_LIFECYCLES", ""))?,
            task_domain: or_default("STAGER_TASK_DOMAIN", DEFAULT_TASK_DOMAIN),
            skip_cert_verify: flag("STAGER_SKIP_CERT_VERIFY"),
            insecure_docker_registry: flag("STAGER_INSECURE_DOCKER_REGISTRY"),
            insecure_docker_registries: list("STAGER_INSECURE_DOCKER_REGISTRIES"),
            docker_registry_addresses: list("STAGER_DOCKER_REGISTRY_ADDRESSES"),
            docker_registry_port,
            docker_stack: or_default("STAGER_DOCKER_STACK", "cflinuxfs3"),
            default_timeout: Duration::from_secs(number(
                &lookup,
                "STAGER_DEFAULT_TIMEOUT_SECS",
                900,
            )?),
            min_memory_mb: number(&lookup, "STAGER_MIN_MEMORY_MB", 1024)?,
            min_disk_mb: number(&lookup, "STAGER_MIN_DISK_MB", 6144)?,
            min_file_descriptors: number(&lookup, "STAGER_MIN_FILE_DESCRIPTORS", 256)?,
            delivery_max_attempts: number(&lookup, "STAGER_DELIVERY_MAX_ATTEMPTS", 3)?,
        })
    }

    /// Recipe builder configuration.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            task_domain: self.task_domain.clone(),
            stager_url: self.stager_url.clone(),
            file_server_url: self.file_server_url.clone(),
            cc_uploader_url: self.cc_uploader_url.clone(),
            lifecycles: self.lifecycles.clone(),
            skip_cert_verify: self.skip_cert_verify,
            insecure_docker_registry: self.insecure_docker_registry,
            insecure_docker_registries: self.insecure_docker_registries.clone(),
            docker_stack: self.docker_stack.clone(),
            default_timeout: self.default_timeout,
            min_memory_mb: self.min_memory_mb,
            min_disk_mb: self.min_disk_mb,
            min_file_descriptors: self.min_file_descriptors,
            ..BackendConfig::default()
        }
    }

    /// Registry resolver over the configured registry addresses.
    pub fn registry_resolver(&self) -> StaticRegistryResolver {
        StaticRegistryResolver::new(
            self.docker_registry_addresses.clone(),
            self.docker_registry_port,
        )
    }
}

fn number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `key=location,key=location`.
fn parse_lifecycles(value: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    split_list(value)
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, location)) if !key.is_empty() && !location.is_empty() => {
                Ok((key.to_string(), location.to_string()))
            }
            _ => Err(ConfigError::InvalidLifecycle(entry)),
        })
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    /// The port number is invalid.
    #[error("Invalid port number")]
    InvalidPort,
    /// The listen address is invalid.
    #[error("Invalid listen address: {0}")]
    InvalidAddr(String),
    /// A numeric variable did not parse.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
    /// A lifecycle entry is not `key=location`.
    #[error("Invalid lifecycle entry: {0}")]
    InvalidLifecycle(String),
}
