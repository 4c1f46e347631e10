use crate::params::{Params, check_num};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Output settings.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of steps between population snapshots.
    pub steps_per_save: usize,
}

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seed for reproducible runs; OS entropy is used when absent.
    pub seed: Option<u64>,
    pub params: Params,
    pub output: OutputConfig,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config = Self::from_toml(&contents)?;

        Ok(config)
    }

    /// Parse and validate a [`Config`] from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.params.validate().context("invalid params")?;
        check_num(self.output.steps_per_save, 1..=10_000)
            .context("invalid number of steps per save")?;
        Ok(())
    }
}
