//! Cache and lifecycle configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lifetime of a cached query result (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 240;

/// Default number of cached results kept per connector
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1000;

/// Default pause between teardown and recreation on reload (milliseconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Query result cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached result in seconds (default: 240)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,

    /// Maximum number of cached results per connector (default: 1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Some(DEFAULT_CACHE_TTL_SECS),
            max_entries: Some(DEFAULT_CACHE_MAX_ENTRIES),
        }
    }
}

impl CacheConfig {
    /// Get the TTL with default fallback
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    /// Get max entries with default fallback
    pub fn max_entries(&self) -> u64 {
        self.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES)
    }
}

/// Connector lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Delay between disconnect and recreation during reload (default: 1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_delay_ms: Option<u64>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: Some(DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

impl LifecycleConfig {
    /// Get the settling delay with default fallback
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS))
    }
}
