// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{AldevConfig, RawAldevConfig};
use crate::errors::Result;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".aldev.yaml";

/// Load a configuration file and return the raw, unvalidated model.
///
/// This only performs YAML deserialization. Use [`load_and_validate`] to get
/// an [`AldevConfig`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawAldevConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading aldev config");

    let contents = fs::read_to_string(path)?;
    let config: RawAldevConfig = serde_yaml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and validate it.
///
/// This is the entry point used by every command. It is called once at
/// startup and again at the start of every generation, so edits to the file
/// are picked up on restart.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<AldevConfig> {
    let raw_config = load_from_path(&path)?;
    let config = AldevConfig::try_from(raw_config)?;
    Ok(config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
