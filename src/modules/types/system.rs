//! System identifier definitions

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Case-insensitive key naming a supported database system (e.g. `snowflake`)
///
/// The identifier is stored trimmed and lowercased, so `"Snowflake"` and
/// `" snowflake "` name the same driver and the same manager slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SystemId(String);

impl SystemId {
    /// Create an identifier, normalizing case and surrounding whitespace
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// The normalized identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty after normalization
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SystemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = SystemId::new(s);
        if id.is_empty() {
            return Err("System identifier cannot be empty".to_string());
        }
        Ok(id)
    }
}

impl From<&str> for SystemId {
    fn from(value: &str) -> Self {
        SystemId::new(value)
    }
}

impl From<String> for SystemId {
    fn from(value: String) -> Self {
        SystemId::new(value)
    }
}

impl From<&SystemId> for SystemId {
    fn from(value: &SystemId) -> Self {
        value.clone()
    }
}

impl From<SystemId> for String {
    fn from(value: SystemId) -> Self {
        value.0
    }
}

impl AsRef<str> for SystemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SystemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_id_case_insensitive() {
        assert_eq!(SystemId::new("Snowflake"), SystemId::new("snowflake"));
        assert_eq!(SystemId::new("  ACME "), SystemId::new("acme"));
        assert_eq!(SystemId::new("ACME").as_str(), "acme");
    }

    #[test]
    fn test_system_id_from_str() {
        assert_eq!(SystemId::from_str("DuckDB").unwrap().as_str(), "duckdb");
        assert!(SystemId::from_str("   ").is_err());
    }

    #[test]
    fn test_system_id_serde() {
        let id: SystemId = serde_json::from_str("\"SnowFlake\"").unwrap();
        assert_eq!(id.as_str(), "snowflake");

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"snowflake\"");
    }
}
