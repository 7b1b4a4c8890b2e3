//! Connector manager holding at most one connector per system

use futures::stream::{self, StreamExt};
use quarry_core::{QuarryError, Result, Settings};
use quarry_types::{ConnectionParameters, SystemId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use super::registry::{ConnectorOptions, DriverRegistry};
use super::traits::Connector;

/// One system's connector, absent until first connect
type Slot = Mutex<Option<Arc<dyn Connector>>>;

/// Manager-wide options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Pause between teardown and recreation during reload
    pub settle_delay: Duration,
    /// Options handed to the registry for every connector
    pub connector: ConnectorOptions,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ManagerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            settle_delay: settings.lifecycle.settle_delay(),
            connector: ConnectorOptions::from(&settings.cache),
        }
    }
}

/// Manages one connector per system identifier
///
/// Operations on the same system are serialized through that system's slot;
/// different systems proceed independently.
pub struct ConnectorManager {
    registry: Arc<DriverRegistry>,
    options: ManagerOptions,
    parameters: RwLock<HashMap<SystemId, ConnectionParameters>>,
    slots: RwLock<HashMap<SystemId, Arc<Slot>>>,
}

impl ConnectorManager {
    /// Create a manager with default options
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self::with_options(registry, ManagerOptions::default())
    }

    /// Create a manager with custom options
    pub fn with_options(registry: Arc<DriverRegistry>, options: ManagerOptions) -> Self {
        Self {
            registry,
            options,
            parameters: RwLock::new(HashMap::new()),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Create a manager backed by the process-wide registry
    pub fn with_global_registry(options: ManagerOptions) -> Result<Self> {
        let registry = DriverRegistry::global()
            .ok_or_else(|| QuarryError::Internal("no driver registry installed".to_string()))?;
        Ok(Self::with_options(registry, options))
    }

    /// Create a manager from loaded settings, registering each system's parameters
    pub async fn from_settings(registry: Arc<DriverRegistry>, settings: &Settings) -> Result<Self> {
        let manager = Self::with_options(registry, ManagerOptions::from(settings));
        for config in &settings.systems {
            manager
                .set_parameters(config.system.as_str(), config.parameters.clone())
                .await?;
        }
        Ok(manager)
    }

    /// Load a YAML configuration file and build a manager from it
    ///
    /// Systems the registry does not support are rejected up front.
    pub async fn from_file(registry: Arc<DriverRegistry>, path: impl AsRef<Path>) -> Result<Self> {
        let settings = quarry_parser::parse_file(path)?;
        quarry_parser::ConfigValidator::new()
            .with_supported(registry.systems())
            .validate(&settings)?;
        Self::from_settings(registry, &settings).await
    }

    pub fn registry(&self) -> &Arc<DriverRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// Register or overwrite the construction parameters of a system
    ///
    /// New parameters apply the next time the connector is instantiated.
    pub async fn set_parameters(&self, system: &str, params: ConnectionParameters) -> Result<()> {
        let id = SystemId::new(system);
        if !self.registry.supports(id.as_str()) {
            return Err(QuarryError::UnknownSystem(id.to_string()));
        }

        tracing::debug!(system = %id, params = ?params, "parameters set");
        self.parameters.write().await.insert(id, params);
        Ok(())
    }

    /// Parameters stored for a system
    pub async fn parameters(&self, system: &str) -> Option<ConnectionParameters> {
        self.parameters.read().await.get(&SystemId::new(system)).cloned()
    }

    /// The connector instance for a system, if one exists
    pub async fn get(&self, system: &str) -> Option<Arc<dyn Connector>> {
        let slot = self.existing_slot(&SystemId::new(system)).await?;
        let current = slot.lock().await;
        current.clone()
    }

    /// Instantiate a connector without connecting it
    ///
    /// Fails with `AlreadyConnected` if a live instance exists; a disconnected
    /// instance is released and replaced.
    pub async fn create(&self, system: &str) -> Result<Arc<dyn Connector>> {
        let id = self.supported(system)?;
        let slot = self.slot(&id).await;
        let mut current = slot.lock().await;
        self.instantiate(&id, &mut current).await
    }

    /// Connect a system, instantiating its connector on first use
    pub async fn connect(&self, system: &str) -> Result<()> {
        let id = self
            .supported(system)
            .map_err(|e| QuarryError::connection(SystemId::new(system).as_str(), e))?;
        let slot = self.slot(&id).await;
        let mut current = slot.lock().await;

        let existing = current.clone();
        let result = match existing {
            Some(connector) => connector.connect().await,
            None => match self.instantiate(&id, &mut current).await {
                Ok(connector) => connector.connect().await,
                Err(e) => Err(e),
            },
        };

        result.map_err(|e| {
            tracing::error!(system = %id, error = %e, "connect failed");
            QuarryError::connection(id.as_str(), e)
        })
    }

    /// Disconnect a system and discard its connector; no-op if absent
    pub async fn disconnect(&self, system: &str) -> Result<()> {
        let id = SystemId::new(system);
        let Some(slot) = self.existing_slot(&id).await else {
            return Ok(());
        };

        let mut current = slot.lock().await;
        let Some(connector) = current.take() else {
            return Ok(());
        };

        connector
            .disconnect()
            .await
            .map_err(|e| QuarryError::disconnection(id.as_str(), e))?;
        tracing::info!(system = %id, "connector removed");
        Ok(())
    }

    /// Tear down, wait the settling delay, then recreate and connect
    pub async fn reload(&self, system: &str) -> Result<()> {
        let id = self
            .supported(system)
            .map_err(|e| QuarryError::connection(SystemId::new(system).as_str(), e))?;
        let slot = self.slot(&id).await;
        let mut current = slot.lock().await;

        if let Some(existing) = current.take() {
            if let Err(e) = existing.disconnect().await {
                tracing::warn!(system = %id, error = %e, "disconnect before reload failed");
            }
        }

        tracing::info!(system = %id, delay = ?self.options.settle_delay, "reloading connector");
        tokio::time::sleep(self.options.settle_delay).await;

        let result = match self.instantiate(&id, &mut current).await {
            Ok(connector) => connector.connect().await,
            Err(e) => Err(e),
        };
        result.map_err(|e| QuarryError::connection(id.as_str(), e))
    }

    /// False if no connector exists, otherwise the connector's liveness check
    pub async fn is_connected(&self, system: &str) -> bool {
        match self.get(system).await {
            Some(connector) => connector.is_connected().await,
            None => false,
        }
    }

    /// Systems that currently have a connector instance, sorted
    pub async fn systems(&self) -> Vec<SystemId> {
        let mut systems = Vec::new();
        for (id, slot) in self.snapshot().await {
            if slot.lock().await.is_some() {
                systems.push(id);
            }
        }
        systems
    }

    /// Liveness of every instantiated connector, checked concurrently
    pub async fn status(&self) -> HashMap<SystemId, bool> {
        let mut instances = Vec::new();
        for (id, slot) in self.snapshot().await {
            if let Some(connector) = slot.lock().await.clone() {
                instances.push((id, connector));
            }
        }

        stream::iter(instances)
            .map(|(id, connector)| async move { (id, connector.is_connected().await) })
            .buffer_unordered(16)
            .collect()
            .await
    }

    /// Disconnect and discard every connector
    ///
    /// Keeps going past individual failures and reports them together.
    pub async fn close_all(&self) -> Result<()> {
        let mut errors = Vec::new();

        for (id, slot) in self.snapshot().await {
            let Some(connector) = slot.lock().await.take() else {
                continue;
            };
            if let Err(e) = connector.disconnect().await {
                tracing::error!(system = %id, error = %e, "failed to close connector");
                errors.push(QuarryError::disconnection(id.as_str(), e));
            }
        }

        if errors.is_empty() {
            tracing::info!("all connectors closed");
            Ok(())
        } else {
            Err(QuarryError::Teardown(errors))
        }
    }

    fn supported(&self, system: &str) -> Result<SystemId> {
        let id = SystemId::new(system);
        if self.registry.supports(id.as_str()) {
            Ok(id)
        } else {
            Err(QuarryError::UnsupportedSystem(id.to_string()))
        }
    }

    /// Build a connector from stored parameters into `current`
    async fn instantiate(
        &self,
        id: &SystemId,
        current: &mut Option<Arc<dyn Connector>>,
    ) -> Result<Arc<dyn Connector>> {
        if let Some(existing) = current.as_ref() {
            if existing.is_connected().await {
                return Err(QuarryError::AlreadyConnected(id.to_string()));
            }
            // Drop any stale session before the instance goes away.
            if let Err(e) = existing.disconnect().await {
                tracing::warn!(system = %id, error = %e, "failed to release replaced connector");
            }
        }

        let params = self
            .parameters
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default();
        let connector = self
            .registry
            .resolve(id, params, &self.options.connector)?;

        tracing::debug!(system = %id, "connector instantiated");
        *current = Some(connector.clone());
        Ok(connector)
    }

    async fn slot(&self, id: &SystemId) -> Arc<Slot> {
        if let Some(slot) = self.existing_slot(id).await {
            return slot;
        }
        self.slots
            .write()
            .await
            .entry(id.clone())
            .or_default()
            .clone()
    }

    async fn existing_slot(&self, id: &SystemId) -> Option<Arc<Slot>> {
        self.slots.read().await.get(id).cloned()
    }

    /// All slots, sorted by system
    async fn snapshot(&self) -> Vec<(SystemId, Arc<Slot>)> {
        let mut slots: Vec<_> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(id, slot)| (id.clone(), slot.clone()))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));
        slots
    }
}
