//! Engine configuration.
//!
//! One [`EngineConfig`] value is threaded into each [`SemanticModel`]; there
//! is no process-wide configuration state.
//!
//! [`SemanticModel`]: super::SemanticModel

use thiserror::Error;

use super::resolver::ConflictResolutionStrategy;

/// Errors produced while reading a `[Configuration]` block or config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(key: &str, value: &str, expected: &'static str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

/// Settings for one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// How to pick between several visible candidates for an unqualified name.
    pub conflict_strategy: ConflictResolutionStrategy,
    /// Do not open an implicit namespace named after the source file.
    pub disable_default_namespace: bool,
    /// Base of indices written in source (`div[1]`).
    pub index_initial_count: usize,
    /// Trace flattened bodies at debug level.
    pub debug_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conflict_strategy: ConflictResolutionStrategy::default(),
            disable_default_namespace: false,
            index_initial_count: 0,
            debug_mode: false,
        }
    }
}

impl EngineConfig {
    pub fn with_strategy(mut self, strategy: ConflictResolutionStrategy) -> Self {
        self.conflict_strategy = strategy;
        self
    }

    pub fn with_index_initial_count(mut self, base: usize) -> Self {
        self.index_initial_count = base;
        self
    }

    pub fn without_default_namespace(mut self) -> Self {
        self.disable_default_namespace = true;
        self
    }

    /// Build a config from the key/value pairs of a `[Configuration]` block.
    ///
    /// Unknown keys are ignored. Values may be quoted.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (key, raw) in pairs {
            let key = key.trim();
            let value = raw.trim().trim_matches('"').trim_matches('\'');
            match key {
                "INDEX_INITIAL_COUNT" => {
                    config.index_initial_count = value
                        .parse()
                        .map_err(|_| ConfigError::invalid(key, value, "a non-negative integer"))?;
                }
                "DISABLE_DEFAULT_NAMESPACE" => {
                    config.disable_default_namespace = parse_bool(key, value)?;
                }
                "DEBUG_MODE" => config.debug_mode = parse_bool(key, value)?,
                "CONFLICT_STRATEGY" => {
                    config.conflict_strategy = value.parse().map_err(|_| {
                        ConfigError::invalid(
                            key,
                            value,
                            "PREFER_CURRENT_NAMESPACE, PREFER_EXPLICIT or ERROR",
                        )
                    })?;
                }
                _ => tracing::trace!("[CONFIG] ignoring unknown key '{}'", key),
            }
        }
        tracing::debug!("[CONFIG] {:?}", config);
        Ok(config)
    }

    /// Read a config from JSON. Missing fields take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::invalid(key, value, "true or false")),
    }
}
