//! Configuration parsing for Quarry
//!
//! This crate loads connection parameters and cache/lifecycle settings from
//! YAML, resolves `{{ env.VAR }}` placeholders and validates the result.

pub mod env;
pub mod validator;
pub mod yaml;

pub use env::EnvSubstitutor;
pub use validator::ConfigValidator;
pub use yaml::YamlParser;

use quarry_core::{QuarryError, Settings};
use std::path::Path;

/// Parse a configuration file from a path
pub fn parse_file(path: impl AsRef<Path>) -> Result<Settings, QuarryError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        QuarryError::Config(format!("Failed to read file '{}': {}", path.display(), e))
    })?;

    parse_string(&content)
}

/// Parse a configuration from a string
pub fn parse_string(content: &str) -> Result<Settings, QuarryError> {
    let settings = YamlParser::parse(content)?;

    ConfigValidator::new().validate(&settings)?;

    tracing::debug!(systems = settings.systems.len(), "configuration loaded");
    Ok(settings)
}
