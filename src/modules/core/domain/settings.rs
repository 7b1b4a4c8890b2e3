//! Root configuration model

use quarry_types::SystemId;
use serde::{Deserialize, Serialize};

use super::{CacheConfig, LifecycleConfig, SystemConfig};

/// Root configuration that represents a Quarry configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Query result cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Connector lifecycle configuration
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Connection parameters per system
    #[serde(default)]
    pub systems: Vec<SystemConfig>,
}

impl Settings {
    /// Create settings with default cache and lifecycle configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the configuration of a system (case-insensitive)
    pub fn find_system(&self, system: &str) -> Option<&SystemConfig> {
        let id = SystemId::new(system);
        self.systems.iter().find(|s| s.system == id)
    }
}
