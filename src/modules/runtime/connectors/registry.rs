//! Driver registry mapping system identifiers to connector constructors

use once_cell::sync::OnceCell;
use quarry_core::{CacheConfig, DriverError, QuarryError, Result};
use quarry_types::{ConnectionParameters, SystemId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::cache::QueryCache;
use super::connector::DriverConnector;
use super::traits::{Connector, Driver};

/// Process-wide default registry, installed once at startup
static GLOBAL: OnceCell<Arc<DriverRegistry>> = OnceCell::new();

/// Options applied to every connector the registry builds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorOptions {
    /// Lifetime of a cached query result
    pub cache_ttl: Duration,
    /// Capacity of each connector's query cache
    pub cache_max_entries: u64,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for ConnectorOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            cache_ttl: config.ttl(),
            cache_max_entries: config.max_entries(),
        }
    }
}

impl ConnectorOptions {
    /// Build a fresh query cache with these options
    pub fn new_cache(&self) -> QueryCache {
        QueryCache::new(self.cache_ttl, self.cache_max_entries)
    }
}

/// Constructor building a disconnected connector for one system
pub type ConnectorConstructor = dyn Fn(&SystemId, ConnectionParameters, &ConnectorOptions) -> Result<Arc<dyn Connector>>
    + Send
    + Sync;

/// Typed registration table of supported systems
///
/// Populate it at startup, then share it behind an `Arc`; it is never
/// mutated once shared.
#[derive(Default)]
pub struct DriverRegistry {
    constructors: HashMap<SystemId, Box<ConnectorConstructor>>,
}

impl DriverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver; `factory` builds the driver from the connection parameters
    pub fn register<D, F>(&mut self, system: impl Into<SystemId>, factory: F) -> &mut Self
    where
        D: Driver,
        F: Fn(&ConnectionParameters) -> std::result::Result<D, DriverError> + Send + Sync + 'static,
    {
        self.register_connector(system, move |system, params, options| {
            let driver = factory(&params).map_err(|e| QuarryError::DriverLoad {
                system: system.to_string(),
                reason: e.to_string(),
            })?;
            let connector = DriverConnector::new(system.clone(), driver, params, options.new_cache())?;
            Ok(Arc::new(connector) as Arc<dyn Connector>)
        })
    }

    /// Register an arbitrary connector constructor
    pub fn register_connector<F>(&mut self, system: impl Into<SystemId>, constructor: F) -> &mut Self
    where
        F: Fn(&SystemId, ConnectionParameters, &ConnectorOptions) -> Result<Arc<dyn Connector>>
            + Send
            + Sync
            + 'static,
    {
        let system = system.into();
        tracing::debug!(system = %system, "registering driver");
        if self.constructors.insert(system.clone(), Box::new(constructor)).is_some() {
            tracing::warn!(system = %system, "driver registration replaced");
        }
        self
    }

    /// Check if a system is registered
    pub fn supports(&self, system: &str) -> bool {
        self.constructors.contains_key(&SystemId::new(system))
    }

    /// All registered systems, sorted
    pub fn systems(&self) -> Vec<SystemId> {
        let mut systems: Vec<SystemId> = self.constructors.keys().cloned().collect();
        systems.sort();
        systems
    }

    /// Instantiate a disconnected connector for `system`
    pub fn resolve(
        &self,
        system: &SystemId,
        params: ConnectionParameters,
        options: &ConnectorOptions,
    ) -> Result<Arc<dyn Connector>> {
        let constructor = self
            .constructors
            .get(system)
            .ok_or_else(|| QuarryError::UnsupportedSystem(system.to_string()))?;

        tracing::debug!(system = %system, params = ?params, "resolving connector");
        constructor(system, params, options).map_err(|e| match e {
            QuarryError::MissingParameter { .. } | QuarryError::DriverLoad { .. } => e,
            other => QuarryError::DriverLoad {
                system: system.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Install `registry` as the process-wide default
    ///
    /// Fails if a default has already been installed.
    pub fn install(registry: DriverRegistry) -> Result<Arc<DriverRegistry>> {
        let registry = Arc::new(registry);
        GLOBAL
            .set(registry.clone())
            .map_err(|_| QuarryError::Internal("driver registry already installed".to_string()))?;
        tracing::info!(systems = registry.constructors.len(), "driver registry installed");
        Ok(registry)
    }

    /// The process-wide default registry, if installed
    pub fn global() -> Option<Arc<DriverRegistry>> {
        GLOBAL.get().cloned()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("systems", &self.systems())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::testing::FakeDriver;

    fn registry() -> DriverRegistry {
        let mut registry = DriverRegistry::new();
        registry.register("Acme", |_| Ok(FakeDriver::requiring(&["user", "password"])));
        registry
    }

    #[test]
    fn test_supports_case_insensitive() {
        let registry = registry();
        assert!(registry.supports("acme"));
        assert!(registry.supports("ACME"));
        assert!(!registry.supports("oracle"));
        assert_eq!(registry.systems(), vec![SystemId::new("acme")]);
    }

    #[tokio::test]
    async fn test_resolve_builds_disconnected_connector() {
        let registry = registry();
        let params = ConnectionParameters::new().with("user", "a").with("password", "b");

        let connector = registry
            .resolve(&SystemId::new("acme"), params, &ConnectorOptions::default())
            .unwrap();
        assert_eq!(connector.system().as_str(), "acme");
        assert!(!connector.is_connected().await);
    }

    #[test]
    fn test_resolve_unsupported() {
        let err = registry()
            .resolve(
                &SystemId::new("oracle"),
                ConnectionParameters::new(),
                &ConnectorOptions::default(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, QuarryError::UnsupportedSystem(ref s) if s == "oracle"));
    }

    #[test]
    fn test_resolve_missing_parameters() {
        let err = registry()
            .resolve(
                &SystemId::new("acme"),
                ConnectionParameters::new(),
                &ConnectorOptions::default(),
            )
            .err()
            .unwrap();
        match err {
            QuarryError::MissingParameter { missing, .. } => {
                assert_eq!(missing, vec!["user".to_string(), "password".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_driver_load_failure() {
        let mut registry = DriverRegistry::new();
        registry.register("acme", |_| -> std::result::Result<FakeDriver, DriverError> {
            Err(DriverError::new("client library not available"))
        });

        let err = registry
            .resolve(
                &SystemId::new("acme"),
                ConnectionParameters::new(),
                &ConnectorOptions::default(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, QuarryError::DriverLoad { .. }));
        assert!(err.to_string().contains("client library not available"));
    }

    #[test]
    fn test_raw_constructor_errors_become_driver_load() {
        let mut registry = DriverRegistry::new();
        registry.register_connector("acme", |_, _, _| {
            Err(QuarryError::Config("bad driver config".to_string()))
        });

        let err = registry
            .resolve(
                &SystemId::new("acme"),
                ConnectionParameters::new(),
                &ConnectorOptions::default(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, QuarryError::DriverLoad { .. }));
    }

    #[test]
    fn test_install_global_once() {
        let installed = DriverRegistry::install(registry()).unwrap();
        assert!(installed.supports("acme"));
        assert!(DriverRegistry::global().unwrap().supports("acme"));
        assert!(DriverRegistry::install(DriverRegistry::new()).is_err());
    }
}
