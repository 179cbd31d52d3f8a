use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid log level '{0}', expected one of off, error, warn, info, debug, trace")]
    InvalidLogLevel(String),
}

/// Runtime settings shared by every host binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum level passed to the platform logger
    pub log_level: String,
    /// Node names (e.g. `TEXTAREA`) accepted as plain fields, compared case-insensitively
    pub recognized_nodes: Vec<String>,
    pub injection: InjectionConfig,
}

/// Toggles for each write-back strategy, in the order they are attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Dispatch a synthetic `beforeinput` insert-text event
    pub input_event: bool,
    /// Simulate a clipboard paste when the text is not visible after the input event
    pub paste_simulation: bool,
    /// Assign raw text content when the paste cannot be performed
    pub direct_content: bool,
    /// Always assign the native value property last
    pub native_value: bool,
    /// Delay between focusing the surface and dispatching the paste event
    pub paste_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            recognized_nodes: ["INPUT", "TEXTAREA", "OBJECT"]
                .into_iter()
                .map(String::from)
                .collect(),
            injection: InjectionConfig::default(),
        }
    }
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            input_event: true,
            paste_simulation: true,
            direct_content: true,
            native_value: true,
            paste_delay_ms: 50,
        }
    }
}

impl Config {
    /// Parse a config from TOML source. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::ConfigParseError {
                config_path: PathBuf::from("<inline>"),
                source,
            })?;
        config.level_filter()?;
        Ok(config)
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.level_filter()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/surface-relay");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    /// Whether `node_name` is one of the recognized plain-field node kinds.
    pub fn recognizes(&self, node_name: &str) -> bool {
        self.recognized_nodes
            .iter()
            .any(|known| known.eq_ignore_ascii_case(node_name))
    }
}
