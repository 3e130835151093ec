//! Configuration loading for the Kstep CLI.
//!
//! The configuration is a small YAML file written to the standard configuration
//! directory (`~/.config/kstep/config.yaml` on most platforms). `KSTEP_CONFIG` overrides
//! the location. Every field is optional:
//!
//! ```yaml
//! namespace: team-a          # substituted for $NAMESPACE in rendered commands
//! resources:                 # extra rows for the static discovery table
//!   - apiVersion: example.com/v1
//!     kind: Widget
//!     resource: widgets
//!     namespaced: true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use kstep_types::ResourceMapping;

/// Environment variable allowing callers to override the configuration file path.
pub const CONFIG_PATH_ENV: &str = "KSTEP_CONFIG";

/// Default filename inside the `kstep` configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Error surfaced when reading the configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure (for example, permissions or a missing explicit file).
    #[error("config I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not valid configuration YAML.
    #[error("config parse error for {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Persisted configuration values.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KstepConfig {
    /// Namespace substituted for the `$NAMESPACE` placeholder.
    pub namespace: Option<String>,
    /// Additional discovery rows; they extend or override the built-in kinds.
    pub resources: Vec<ResourceMapping>,
}

impl KstepConfig {
    /// Loads the configuration from `$KSTEP_CONFIG` or the default location.
    ///
    /// A missing file yields defaults; an unparsable file is reported with a warning and
    /// also yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_config_path();
        match read_config(&path) {
            Ok(Some(config)) => Ok(config),
            Ok(None) => {
                debug!(path = %path.display(), "no config file; using defaults");
                Ok(Self::default())
            }
            Err(ConfigError::Parse { path, source }) => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "Failed to parse config file; using defaults"
                );
                Ok(Self::default())
            }
            Err(error) => Err(error),
        }
    }

    /// Loads the configuration from an explicitly requested path. Missing or invalid
    /// files are errors.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match read_config(path)? {
            Some(config) => Ok(config),
            None => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            }),
        }
    }
}

/// Resolves the configuration path: `$KSTEP_CONFIG` (tilde expanded) or
/// `<config_dir>/kstep/config.yaml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_home(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kstep")
        .join(CONFIG_FILE_NAME)
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    ["~/", "~\\"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .map(|rest| home().join(rest))
        .unwrap_or_else(|| PathBuf::from(trimmed))
}

fn read_config(path: &Path) -> Result<Option<KstepConfig>, ConfigError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if data.trim().is_empty() {
        return Ok(Some(KstepConfig::default()));
    }
    serde_yaml::from_str(&data).map(Some).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
