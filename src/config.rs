//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/structree/structree.toml`
//! 3. Local config: file given with `--config`
//! 4. Environment variables: `STRUCTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{EngineOptions, IdPolicy, DEFAULT_MAX_DEPTH, DEFAULT_TYPE};

/// Unified configuration for structree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Type tag for nodes whose literal has none (default: "div")
    pub default_type: String,
    /// Treatment of caller-supplied node ids
    pub id_policy: IdPolicy,
    /// Deepest tree the engine accepts (default: 256)
    pub max_depth: usize,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_type: DEFAULT_TYPE.to_string(),
            id_policy: IdPolicy::Trust,
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub default_type: Option<String>,
    pub id_policy: Option<IdPolicy>,
    pub max_depth: Option<usize>,
    pub pretty: Option<bool>,
}

/// Get the XDG config directory for structree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "structree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("structree.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a path given on the command line.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            default_type: overlay
                .default_type
                .clone()
                .unwrap_or_else(|| self.default_type.clone()),
            id_policy: overlay.id_policy.unwrap_or(self.id_policy),
            max_depth: overlay.max_depth.unwrap_or(self.max_depth),
            pretty: overlay.pretty.unwrap_or(self.pretty),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file; it must exist when given
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        if let Some(path) = local {
            let path = expand_path(path);
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            debug!("local config: {}", path.display());
            current = current.merge_with(&load_raw_settings(&path)?);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current, env_source())?;

        current.validate()?;
        Ok(current)
    }

    /// Apply STRUCTREE_* variables from `env` as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("default_type") {
            settings.default_type = val;
        }
        if let Ok(val) = config.get_string("id_policy") {
            settings.id_policy = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_int("max_depth") {
            settings.max_depth = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("max_depth must not be negative, got {}", val),
            })?;
        }
        if let Ok(val) = config.get_bool("pretty") {
            settings.pretty = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.default_type.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "default_type must not be empty".into(),
            });
        }
        if self.max_depth == 0 {
            return Err(ApplicationError::Config {
                message: "max_depth must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Engine construction options derived from these settings.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            default_type: self.default_type.clone(),
            id_policy: self.id_policy,
            max_depth: self.max_depth,
        }
    }

    /// Render as TOML, the format of the config files.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

/// `STRUCTREE_*` variables of the process environment.
fn env_source() -> Environment {
    Environment::with_prefix("STRUCTREE")
        .prefix_separator("_")
        .separator("__")
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
