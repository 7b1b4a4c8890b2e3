//! Configuration validation

use once_cell::sync::Lazy;
use quarry_core::{QuarryError, Settings};
use quarry_types::SystemId;
use regex::Regex;
use std::collections::HashSet;

/// Valid system identifiers (lower-kebab-case or lower_snake_case)
static SYSTEM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(?:[-_][a-z0-9]+)*$").expect("system pattern is valid")
});

/// Configuration validator
pub struct ConfigValidator {
    /// Whether to validate identifier format strictly
    strict_names: bool,
    /// Reject parameter values that still hold `{{ ... }}` placeholders
    require_resolved: bool,
    /// Identifiers accepted in `systems`; `None` accepts any
    supported: Option<HashSet<SystemId>>,
}

impl ConfigValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            strict_names: true,
            require_resolved: true,
            supported: None,
        }
    }

    /// Create a validator with lenient identifier checking
    pub fn lenient() -> Self {
        Self {
            strict_names: false,
            require_resolved: false,
            supported: None,
        }
    }

    /// Reject systems that are not in `supported`
    pub fn with_supported<I, S>(mut self, supported: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SystemId>,
    {
        self.supported = Some(supported.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self, settings: &Settings) -> Result<(), QuarryError> {
        self.validate_cache(settings)?;
        self.validate_systems(settings)?;
        Ok(())
    }

    fn validate_cache(&self, settings: &Settings) -> Result<(), QuarryError> {
        if settings.cache.ttl().is_zero() {
            return Err(QuarryError::Validation(
                "Cache TTL must be greater than zero".to_string(),
            ));
        }
        if settings.cache.max_entries() == 0 {
            return Err(QuarryError::Validation(
                "Cache max_entries must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_systems(&self, settings: &Settings) -> Result<(), QuarryError> {
        let mut seen = HashSet::new();

        for config in &settings.systems {
            let id = &config.system;

            if id.is_empty() {
                return Err(QuarryError::Validation(
                    "System identifier cannot be empty".to_string(),
                ));
            }

            if self.strict_names && !SYSTEM_PATTERN.is_match(id.as_str()) {
                return Err(QuarryError::Validation(format!(
                    "Invalid system identifier '{}': must be lower-kebab-case or lower_snake_case",
                    id
                )));
            }

            // Identifiers are case-folded, so `Snowflake` and `snowflake` collide.
            if !seen.insert(id) {
                return Err(QuarryError::Validation(format!(
                    "Duplicate system: '{}'",
                    id
                )));
            }

            if let Some(supported) = &self.supported {
                if !supported.contains(id) {
                    return Err(QuarryError::UnknownSystem(id.to_string()));
                }
            }

            if config.parameters.keys().any(|key| key.trim().is_empty()) {
                return Err(QuarryError::Validation(format!(
                    "System '{}' has a parameter with an empty name",
                    id
                )));
            }

            if self.require_resolved && config.has_env_placeholders() {
                return Err(QuarryError::Validation(format!(
                    "System '{}' has unresolved environment placeholders",
                    id
                )));
            }
        }

        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
