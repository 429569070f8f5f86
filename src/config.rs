//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pulsetree/pulsetree.toml`
//! 3. Local config: `--config <file>` or `./.pulsetree.toml`
//! 4. Environment variables: `PULSETREE_*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};

/// Name of the local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".pulsetree.toml";

/// Unified configuration for pulsetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Milliseconds a pulse stays visible after an activation (default: 600)
    pub pulse_delay_ms: u64,
    /// Hierarchy definition file; the built-in diagram when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<PathBuf>,
    /// Colored terminal output (default: true)
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pulse_delay_ms: 600,
            hierarchy: None,
            color: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub pulse_delay_ms: Option<u64>,
    pub hierarchy: Option<PathBuf>,
    pub color: Option<bool>,
}

/// Get the XDG config directory for pulsetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pulsetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pulsetree.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ApplicationResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    pub fn pulse_delay(&self) -> Duration {
        Duration::from_millis(self.pulse_delay_ms)
    }

    /// Expand shell variables and tilde in the hierarchy path.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.hierarchy {
            let expanded = expand_env_vars(path.to_string_lossy().as_ref());
            self.hierarchy = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins for every field it specifies.
    ///
    /// A relative hierarchy path is resolved against the directory of the
    /// file that declared it.
    fn merge_with(&self, overlay: &RawSettings, origin: &Path) -> Self {
        let base_dir = origin.parent().unwrap_or_else(|| Path::new(""));
        Self {
            pulse_delay_ms: overlay.pulse_delay_ms.unwrap_or(self.pulse_delay_ms),
            hierarchy: overlay
                .hierarchy
                .as_ref()
                .map(|p| resolve_relative(base_dir, p))
                .or_else(|| self.hierarchy.clone()),
            color: overlay.color.unwrap_or(self.color),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit local config file; must exist when given. Without
    ///   it, `./.pulsetree.toml` is used if present.
    #[instrument(level = "debug")]
    pub fn load(local: Option<&Path>) -> ApplicationResult<Self> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw, &global_path);
            }
        }

        // 3. Local config
        let local_path = match local {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = local_config_path(Path::new("."));
                candidate.exists().then_some(candidate)
            }
        };
        if let Some(local_path) = local_path {
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw, &local_path);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        debug!(?current, "settings loaded");
        Ok(current)
    }

    /// Apply PULSETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> ApplicationResult<Self> {
        Self::apply_env_source(settings, env_source())
    }

    fn apply_env_source(mut settings: Self, source: Environment) -> ApplicationResult<Self> {
        let config = Config::builder()
            .add_source(source)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(config.get_int("pulse_delay_ms"))? {
            settings.pulse_delay_ms = u64::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("PULSETREE_PULSE_DELAY_MS must not be negative: {val}"),
            })?;
        }
        if let Some(val) = env_value(config.get_string("hierarchy"))? {
            settings.hierarchy = Some(PathBuf::from(val));
        }
        if let Some(val) = env_value(config.get_bool("color"))? {
            settings.color = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pulsetree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pulsetree/pulsetree.toml
#   Local:  ./.pulsetree.toml or --config <file>
#   Env:    PULSETREE_* environment variables

# Milliseconds a pulse stays visible after a click
# pulse_delay_ms = 600

# Hierarchy definition (TOML, [[nodes]] tables); built-in diagram when unset
# hierarchy = "~/diagrams/app.toml"

# Colored output
# color = true
"#
        .to_string()
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if path.is_absolute() || raw.starts_with('~') || raw.starts_with('$') {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// `PULSETREE_PULSE_DELAY_MS` style variables: single underscore after the prefix.
fn env_source() -> Environment {
    Environment::with_prefix("PULSETREE")
        .prefix_separator("_")
        .separator("__")
}

/// Unset variables are skipped; set but unparseable ones are errors.
fn env_value<T>(result: Result<T, ConfigError>) -> ApplicationResult<Option<T>> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
