// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Image registry address resolution for docker image caching.

/// Default port of the platform image registry.
pub const DEFAULT_DOCKER_REGISTRY_PORT: u16 = 8080;

/// Addresses a logical registry name resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryEndpoints {
    /// Registry host addresses
    pub addresses: Vec<String>,
    /// Port the registry listens on
    pub port: u16,
}

impl RegistryEndpoints {
    /// Each address as `host:port`.
    pub fn host_ports(&self) -> Vec<String> {
        self.addresses
            .iter()
            .map(|address| format!("{}:{}", address, self.port))
            .collect()
    }
}

/// Resolves a logical registry name to its addresses.
///
/// Implementations must not block; resolution happens while a recipe is
/// being built.
pub trait RegistryResolver: Send + Sync {
    /// Resolve `registry`. An empty address list means unavailable.
    fn resolve(&self, registry: &str) -> RegistryEndpoints;
}

/// Resolver backed by a fixed address list.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistryResolver {
    endpoints: RegistryEndpoints,
}

impl StaticRegistryResolver {
    /// Create a resolver that answers every lookup with `addresses` on `port`.
    pub fn new(addresses: Vec<String>, port: u16) -> Self {
        Self {
            endpoints: RegistryEndpoints { addresses, port },
        }
    }

    /// Resolver that never finds a registry.
    pub fn empty() -> Self {
        Self::new(Vec::new(), DEFAULT_DOCKER_REGISTRY_PORT)
    }
}

impl RegistryResolver for StaticRegistryResolver {
    fn resolve(&self, _registry: &str) -> RegistryEndpoints {
        self.endpoints.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_ports_pairs_every_address() {
        let resolver = StaticRegistryResolver::new(
            vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            DEFAULT_DOCKER_REGISTRY_PORT,
        );
        let endpoints = resolver.resolve("docker-registry.service.cf.internal");
        assert_eq!(endpoints.host_ports(), vec!["10.0.0.1:8080", "10.0.0.2:8080"]);
    }

    #[test]
    fn test_empty_resolver_has_no_addresses() {
        assert!(StaticRegistryResolver::empty().resolve("any").addresses.is_empty());
    }
}
