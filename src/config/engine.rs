use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::EngineError;

const CONFIG_FILE_NAME: &str = "engine.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Request narrative text by default
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Consecutive failures before the generator is treated as unavailable
    pub failure_threshold: u64,
    pub cooldown_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        NarrativeConfig {
            enabled: false,
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            timeout_secs: 30,
            failure_threshold: 3,
            cooldown_secs: 60,
        }
    }
}

impl NarrativeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Fan-out policy used when generating reports for many students at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub width: usize,
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            width: 5,
            delay_ms: 1000,
        }
    }
}

impl BatchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub narrative: NarrativeConfig,
    pub batch: BatchConfig,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str::<EngineConfig>(content)?)
    }

    /// Load from an explicit path. Unlike the default lookup, a missing or
    /// broken file here is an error.
    pub fn load_from(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::from(e).with_context(format!("path: {:?}", path)))?;
        Self::from_toml_str(&content)
            .map_err(|e| e.with_context(format!("path: {:?}", path)))
    }
}

pub fn get_config_path() -> PathBuf {
    // Use platform-specific app data directory
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support/weakscope");
            dir.push(CONFIG_FILE_NAME);
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push("weakscope");
            dir.push(CONFIG_FILE_NAME);
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share/weakscope");
            dir.push(CONFIG_FILE_NAME);
            return dir;
        }
    }

    // Fallback
    PathBuf::from(CONFIG_FILE_NAME)
}

fn load_engine_config_internal() -> EngineConfig {
    let config_path = get_config_path();

    match fs::read_to_string(&config_path) {
        Ok(content) => match EngineConfig::from_toml_str(&content) {
            Ok(config) => {
                tracing::info!(path = ?config_path, "Loaded engine config");
                config
            }
            Err(e) => {
                tracing::warn!(path = ?config_path, error = %e, "Failed to parse engine config, using defaults");
                EngineConfig::default()
            }
        },
        Err(_) => {
            tracing::debug!(path = ?config_path, "No engine config file, using defaults");
            EngineConfig::default()
        }
    }
}

lazy_static! {
    static ref ENGINE_CONFIG: EngineConfig = load_engine_config_internal();
}

/// Configuration from the default location, read once per process
pub fn get_engine_config() -> &'static EngineConfig {
    &ENGINE_CONFIG
}
