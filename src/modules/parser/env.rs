//! Environment variable substitution for connection parameters

use once_cell::sync::Lazy;
use quarry_core::QuarryError;
use regex::{Captures, Regex};

/// Placeholder syntax: `{{ env.VAR_NAME }}` or `{{ env.VAR_NAME | fallback }}`
static ENV_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*(?:\|\s*([^}]*?)\s*)?\}\}")
        .expect("env placeholder pattern is valid")
});

/// Resolves `{{ env.* }}` placeholders against the process environment
pub struct EnvSubstitutor {
    /// Fail when a variable without fallback is unset
    strict: bool,
    /// Load a `.env` file before the first lookup
    load_dotenv: bool,
}

impl EnvSubstitutor {
    /// Strict substitutor that also reads a `.env` file if one is present
    pub fn new() -> Self {
        Self {
            strict: true,
            load_dotenv: true,
        }
    }

    /// Leaves placeholders of unset variables untouched
    pub fn lenient() -> Self {
        Self {
            strict: false,
            load_dotenv: true,
        }
    }

    /// Skip reading the `.env` file
    pub fn without_dotenv(mut self) -> Self {
        self.load_dotenv = false;
        self
    }

    /// Substitute every placeholder in `content`
    ///
    /// In strict mode all unset variables are reported together.
    pub fn substitute(&self, content: &str) -> Result<String, QuarryError> {
        if self.load_dotenv {
            // A missing .env file is the common case.
            let _ = dotenvy::dotenv();
        }

        let mut missing: Vec<String> = Vec::new();
        let substituted = ENV_PATTERN.replace_all(content, |cap: &Captures<'_>| {
            let name = &cap[1];
            match (std::env::var(name), cap.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(fallback)) => fallback.as_str().to_string(),
                (Err(_), None) => {
                    if self.strict && !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });

        if !missing.is_empty() {
            return Err(QuarryError::EnvVarNotFound(missing.join(", ")));
        }

        Ok(substituted.into_owned())
    }

    /// Check if a string contains environment variable placeholders
    pub fn has_placeholders(content: &str) -> bool {
        ENV_PATTERN.is_match(content)
    }

    /// Extract all referenced environment variable names
    pub fn extract_var_names(content: &str) -> Vec<String> {
        ENV_PATTERN
            .captures_iter(content)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}

impl Default for EnvSubstitutor {
    fn default() -> Self {
        Self::new()
    }
}
