//! Per-system connection configuration

use quarry_types::{ConnectionParameters, SystemId};
use serde::{Deserialize, Serialize};

/// Connection parameters configured for one database system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// System identifier (matches a registered driver)
    pub system: SystemId,

    /// Parameters handed to the driver (supports environment variable substitution)
    #[serde(default)]
    pub parameters: ConnectionParameters,
}

impl SystemConfig {
    /// Create a new system configuration
    pub fn new(system: impl Into<SystemId>, parameters: ConnectionParameters) -> Self {
        Self {
            system: system.into(),
            parameters,
        }
    }

    /// Check if any parameter value still contains an unresolved placeholder
    pub fn has_env_placeholders(&self) -> bool {
        self.parameters
            .iter()
            .any(|(_, value)| value.contains("{{") && value.contains("}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_config_new() {
        let config = SystemConfig::new(
            "Snowflake",
            ConnectionParameters::new().with("user", "alice"),
        );
        assert_eq!(config.system.as_str(), "snowflake");
        assert_eq!(config.parameters.get("user"), Some("alice"));
    }

    #[test]
    fn test_system_config_env_placeholders() {
        let config = SystemConfig::new(
            "snowflake",
            ConnectionParameters::new().with("password", "{{ env.SF_PASSWORD }}"),
        );
        assert!(config.has_env_placeholders());

        let resolved = SystemConfig::new(
            "snowflake",
            ConnectionParameters::new().with("password", "secret"),
        );
        assert!(!resolved.has_env_placeholders());
    }

    #[test]
    fn test_system_config_serde() {
        let json = r#"{"system":"DuckDB","parameters":{"path":"/tmp/db"}}"#;
        let config: SystemConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.system.as_str(), "duckdb");
        assert_eq!(config.parameters.get("path"), Some("/tmp/db"));
    }
}
