//! Loading the agent configuration from disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::AgentConfig;

/// Default location of the agent configuration.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pma/config.yaml";

/// YAML configuration file on disk.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, parse and validate the file. A missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML for
    /// [`AgentConfig`], or fails validation.
    pub fn load(&self) -> Result<AgentConfig> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        let config: AgentConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", self.path.display()))?;
        Ok(config)
    }
}
