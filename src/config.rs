use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SinalizaError};

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the passage service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds; requests never time out when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Discard search completions that are not from the latest search
    #[serde(default)]
    pub fence_stale_searches: bool,
    /// Interpreter id preloaded into the translation form
    #[serde(default)]
    pub interpreter_id: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SinalizaError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SinalizaError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SinalizaError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SinalizaError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
