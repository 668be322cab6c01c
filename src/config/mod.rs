//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::Result;
use std::path::Path;

/// Example configuration written by `keysynth init`
pub const EXAMPLE_CONFIG: &str = include_str!("../../keysynth.example.yaml");

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<KeysynthConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: KeysynthConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load the file if it exists, otherwise fall back to defaults
pub fn load_or_default(path: &Path) -> Result<KeysynthConfig> {
    if path.exists() {
        load_config(path)
    } else {
        log::info!("{:?} not found, using default configuration", path);
        Ok(KeysynthConfig::default())
    }
}
