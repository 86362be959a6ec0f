//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Layerforge has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Per-project overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$LAYERFORGE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/layerforge/config.toml`
//! 3. `~/.layerforge/config.toml` (canonical write location)
//!
//! # Project Config Location
//!
//! `<project>/.layerforge/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use layerforge::core::config::Config;
//! use layerforge::session::Session;
//! use layerforge::registry::Registry;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! println!("Derive seed: {}", config.derive_seed());
//!
//! let session = Session::with_settings(Registry::new(), config.session_settings());
//! assert!(session.tree().is_empty());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, IdsConfig, ProjectConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::ids::{IdStrategy, DEFAULT_ID_LENGTH};
use crate::schema::DEFAULT_SEED;
use crate::session::SessionSettings;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence: project config overrides global
/// config, which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration (if a project dir was given and has one)
    pub project: Option<ProjectConfig>,
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default global locations, plus the
    /// project config under `project_dir` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let global_path = Self::find_global();
        Self::load_from(global_path.as_deref(), project_dir)
    }

    /// Load configuration from an explicit global file and project dir.
    ///
    /// A `global_path` that does not exist is treated as absent.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let (global, global_path) = match global_path.filter(|p| p.exists()) {
            Some(path) => (read_toml::<GlobalConfig>(path)?, Some(path.to_path_buf())),
            None => (GlobalConfig::default(), None),
        };

        let project_file = project_dir
            .map(Self::project_config_path)
            .filter(|p| p.exists());
        let project = project_file
            .as_deref()
            .map(read_toml::<ProjectConfig>)
            .transpose()?;

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        debug!(
            global = ?global_path,
            project = ?project_file,
            "loaded configuration"
        );

        Ok(Config {
            global,
            project,
            global_path,
            project_path: project_file,
        })
    }

    /// First existing global config file, if any.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $LAYERFORGE_CONFIG
        if let Ok(path) = std::env::var("LAYERFORGE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/layerforge/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("layerforge/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.layerforge/config.toml
        dirs::home_dir()
            .map(|home| home.join(".layerforge/config.toml"))
            .filter(|path| path.exists())
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.layerforge/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".layerforge/config.toml"))
    }

    /// Get the path for project config under `project_dir`.
    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(".layerforge/config.toml")
    }

    /// Write global config atomically.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write project config atomically.
    pub fn write_project(
        project_dir: &Path,
        config: &ProjectConfig,
    ) -> Result<PathBuf, ConfigError> {
        let path = Self::project_config_path(project_dir);
        write_config_atomic(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Seed for default-prop derivation.
    ///
    /// Defaults to [`DEFAULT_SEED`].
    pub fn derive_seed(&self) -> u64 {
        self.project
            .as_ref()
            .and_then(|p| p.derive_seed)
            .or(self.global.derive_seed)
            .unwrap_or(DEFAULT_SEED)
    }

    /// Whether structural no-ops are reported as errors.
    ///
    /// Defaults to `false`.
    pub fn strict(&self) -> bool {
        self.project
            .as_ref()
            .and_then(|p| p.strict)
            .or(self.global.strict)
            .unwrap_or(false)
    }

    /// Id generation strategy.
    ///
    /// Defaults to short ids of [`DEFAULT_ID_LENGTH`] characters.
    pub fn id_strategy(&self) -> IdStrategy {
        let strategy = self.ids_value(|ids| ids.strategy.clone());
        match strategy.as_deref() {
            Some("uuid") => IdStrategy::Uuid,
            _ => IdStrategy::Short {
                length: self.ids_value(|ids| ids.length).unwrap_or(DEFAULT_ID_LENGTH),
            },
        }
    }

    /// Fixed id seed, if configured.
    pub fn id_seed(&self) -> Option<u64> {
        self.ids_value(|ids| ids.seed)
    }

    /// Settings for a new [`Session`](crate::session::Session).
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            derive_seed: self.derive_seed(),
            id_strategy: self.id_strategy(),
            id_seed: self.id_seed(),
            strict: self.strict(),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    /// A single `[ids]` key, project first.
    fn ids_value<T>(&self, get: impl Fn(&IdsConfig) -> Option<T>) -> Option<T> {
        self.project
            .as_ref()
            .and_then(|p| p.ids.as_ref())
            .and_then(&get)
            .or_else(|| self.global.ids.as_ref().and_then(&get))
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a config file atomically (temp file in the same dir, then rename).
fn write_config_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let write_err = |e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_without_files() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.toml");
        let config = Config::load_from(Some(&missing), Some(temp.path())).unwrap();

        assert_eq!(config.derive_seed(), DEFAULT_SEED);
        assert!(!config.strict());
        assert_eq!(config.id_strategy(), IdStrategy::Short { length: 7 });
        assert!(config.id_seed().is_none());
        assert!(config.global_config_loaded_from().is_none());
        assert!(config.project_config_loaded_from().is_none());
    }

    #[test]
    fn load_global_file() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        write(
            &global,
            r#"
            derive_seed = 42

            [ids]
            length = 12
            "#,
        );

        let config = Config::load_from(Some(&global), None).unwrap();

        assert_eq!(config.derive_seed(), 42);
        assert_eq!(config.id_strategy(), IdStrategy::Short { length: 12 });
        assert_eq!(config.global_config_loaded_from(), Some(global.as_path()));
    }

    #[test]
    fn project_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        write(
            &global,
            r#"
            derive_seed = 42
            strict = false

            [ids]
            length = 12
            seed = 5
            "#,
        );
        let project = temp.path().join("app");
        write(
            &Config::project_config_path(&project),
            r#"
            strict = true

            [ids]
            length = 9
            "#,
        );

        let config = Config::load_from(Some(&global), Some(&project)).unwrap();

        assert_eq!(config.derive_seed(), 42);
        assert!(config.strict());
        assert_eq!(config.id_strategy(), IdStrategy::Short { length: 9 });
        // Keys the project leaves out still come from global.
        assert_eq!(config.id_seed(), Some(5));
    }

    #[test]
    fn uuid_strategy() {
        let temp = TempDir::new().unwrap();
        write(
            &Config::project_config_path(temp.path()),
            "[ids]\nstrategy = \"uuid\"",
        );

        let config = Config::load_from(None, Some(temp.path())).unwrap();
        assert_eq!(config.id_strategy(), IdStrategy::Uuid);
    }

    #[test]
    fn session_settings_follow_accessors() {
        let config = Config {
            project: Some(ProjectConfig {
                derive_seed: Some(8),
                strict: Some(true),
                ids: None,
            }),
            ..Default::default()
        };

        let settings = config.session_settings();
        assert_eq!(settings.derive_seed, 8);
        assert!(settings.strict);
        assert_eq!(settings.id_strategy, IdStrategy::default());
        assert!(settings.id_seed.is_none());
    }

    #[test]
    fn write_project_config_atomic() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig {
            derive_seed: Some(77),
            ..Default::default()
        };

        let path = Config::write_project(temp.path(), &config).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = Config::load_from(None, Some(temp.path())).unwrap();
        assert_eq!(loaded.derive_seed(), 77);
    }

    #[test]
    fn invalid_length_rejected() {
        let temp = TempDir::new().unwrap();
        write(&Config::project_config_path(temp.path()), "[ids]\nlength = 2");

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        write(
            &Config::project_config_path(temp.path()),
            r#"
            strict = true
            unknown_field = true
            "#,
        );

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
