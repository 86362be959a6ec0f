//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$LAYERFORGE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/layerforge/config.toml`
//! 3. `~/.layerforge/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! Located at `<project>/.layerforge/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing; an id length outside
//! [`IdsConfig::LENGTH_RANGE`] or an unknown id strategy is rejected.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// derive_seed = 1234
/// strict = false
///
/// [ids]
/// strategy = "short"
/// length = 7
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Seed for default-prop derivation
    pub derive_seed: Option<u64>,

    /// Report structural no-ops as errors
    pub strict: Option<bool>,

    /// Layer id generation
    pub ids: Option<IdsConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ids) = &self.ids {
            ids.validate()?;
        }
        Ok(())
    }
}

/// Project configuration. Every key overrides its global counterpart.
///
/// # Example
///
/// ```toml
/// strict = true
///
/// [ids]
/// strategy = "uuid"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub derive_seed: Option<u64>,

    pub strict: Option<bool>,

    pub ids: Option<IdsConfig>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ids) = &self.ids {
            ids.validate()?;
        }
        Ok(())
    }
}

/// Layer id settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdsConfig {
    /// "short" or "uuid"
    pub strategy: Option<String>,

    /// Length of short ids
    pub length: Option<usize>,

    /// Fixed seed for reproducible ids (tests, fixtures)
    pub seed: Option<u64>,
}

impl IdsConfig {
    /// Valid id strategies.
    pub const VALID_STRATEGIES: &'static [&'static str] = &["short", "uuid"];

    /// Accepted short id lengths.
    pub const LENGTH_RANGE: RangeInclusive<usize> = 4..=32;

    /// Validate the id configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(strategy) = &self.strategy {
            if !Self::VALID_STRATEGIES.contains(&strategy.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid id strategy '{}', must be one of: {}",
                    strategy,
                    Self::VALID_STRATEGIES.join(", ")
                )));
            }
        }
        if let Some(length) = self.length {
            if !Self::LENGTH_RANGE.contains(&length) {
                return Err(ConfigError::InvalidValue(format!(
                    "id length {} out of range {}..={}",
                    length,
                    Self::LENGTH_RANGE.start(),
                    Self::LENGTH_RANGE.end()
                )));
            }
        }
        Ok(())
    }
}
