//! YAML configuration parser

use quarry_core::{CacheConfig, LifecycleConfig, QuarryError, Settings, SystemConfig};
use quarry_types::ConnectionParameters;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::env::EnvSubstitutor;

/// YAML parser for Quarry configuration files
pub struct YamlParser;

/// Map-based schema: `systems: { <id>: { <key>: <scalar> } }`
#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    cache: Option<CacheConfig>,

    #[serde(default)]
    lifecycle: Option<LifecycleConfig>,

    #[serde(default)]
    systems: BTreeMap<String, Option<BTreeMap<String, serde_yaml::Value>>>,
}

impl YamlParser {
    /// Parse a YAML string into Settings, then resolve `{{ env.* }}` placeholders
    ///
    /// Placeholders are resolved inside parameter values only, after parsing,
    /// so variable contents are never read as YAML.
    pub fn parse(content: &str) -> Result<Settings, QuarryError> {
        let settings = Self::parse_raw(content)?;
        resolve_env(settings, &EnvSubstitutor::new())
    }

    /// Parse a YAML string without environment variable substitution
    pub fn parse_raw(content: &str) -> Result<Settings, QuarryError> {
        // Empty documents deserialize to unit, not to a map.
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        match serde_yaml::from_str::<FileConfig>(content) {
            Ok(file) => file_to_settings(file),
            Err(map_err) => {
                // List-based schema mirrors `Settings` directly.
                serde_yaml::from_str::<Settings>(content).map_err(|_| {
                    QuarryError::Config(format!("YAML parse error: {}", map_err))
                })
            }
        }
    }
}

fn file_to_settings(file: FileConfig) -> Result<Settings, QuarryError> {
    let mut systems = Vec::with_capacity(file.systems.len());

    for (name, entries) in file.systems {
        let mut parameters = ConnectionParameters::new();
        for (key, value) in entries.unwrap_or_default() {
            match yaml_scalar_to_string(value) {
                Ok(Some(text)) => parameters.insert(key, text),
                Ok(None) => {
                    tracing::debug!(system = %name, key = %key, "skipping null parameter");
                }
                Err(kind) => {
                    return Err(QuarryError::Config(format!(
                        "Parameter '{}.{}' must be a string, found a {}; quote the value to keep it verbatim",
                        name, key, kind
                    )));
                }
            }
        }
        systems.push(SystemConfig::new(name, parameters));
    }

    Ok(Settings {
        cache: file.cache.unwrap_or_default(),
        lifecycle: file.lifecycle.unwrap_or_default(),
        systems,
    })
}

/// Substitute placeholders in every parameter value, reporting all unset variables together
fn resolve_env(mut settings: Settings, substitutor: &EnvSubstitutor) -> Result<Settings, QuarryError> {
    let mut missing: Vec<String> = Vec::new();

    for config in &mut settings.systems {
        let mut resolved = ConnectionParameters::new();
        for (key, value) in config.parameters.iter() {
            match substitutor.substitute(value) {
                Ok(text) => resolved.insert(key, text),
                Err(QuarryError::EnvVarNotFound(names)) => {
                    for name in names.split(", ") {
                        if !missing.iter().any(|m| m == name) {
                            missing.push(name.to_string());
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
        config.parameters = resolved;
    }

    if !missing.is_empty() {
        return Err(QuarryError::EnvVarNotFound(missing.join(", ")));
    }
    Ok(settings)
}

/// Render a scalar as text; `Ok(None)` for null, `Err(kind)` otherwise
///
/// Numbers are rejected: their source text is lost once parsed, so `1e3`
/// or `0x1F` would reach the driver as `1000.0` or `31`.
fn yaml_scalar_to_string(value: serde_yaml::Value) -> Result<Option<String>, &'static str> {
    match value {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        serde_yaml::Value::Number(_) => Err("number"),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Sequence(_) => Err("sequence"),
        serde_yaml::Value::Mapping(_) => Err("mapping"),
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(tagged.value),
    }
}
