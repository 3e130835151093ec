//! Shared helpers for the Kstep binaries: configuration discovery and loading.

pub mod config;

pub use config::{CONFIG_FILE_NAME, CONFIG_PATH_ENV, ConfigError, KstepConfig, default_config_path, expand_home};
