use std::{fs, path::PathBuf};

use common::prelude::BridgeConfig;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "agebox";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine home directory")]
    NoHomeDirectory,
    #[error("agebox directory already initialized")]
    AlreadyInitialized,
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),
    #[error("failed to write config: {0}")]
    WriteConfig(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level, overridable with `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files (optional, logs to stderr only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// How long the CLI waits for a call to settle
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Worker thread settings for exported calls
    #[serde(default)]
    pub bridge: BridgeConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            timeout_secs: default_timeout_secs(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> Result<tracing::Level, StateError> {
        self.log_level
            .parse()
            .map_err(|_| StateError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the agebox directory (~/.agebox)
    pub agebox_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the agebox directory path (custom or default ~/.agebox)
    pub fn agebox_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Write a config file into a fresh agebox directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let agebox_dir = Self::agebox_dir(custom_path)?;
        let config_path = agebox_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&agebox_dir)?;

        let config = config.unwrap_or_default();
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            agebox_dir,
            config_path,
            config,
        })
    }

    /// Load state from the agebox directory.
    ///
    /// A missing directory or config file means defaults; nothing is
    /// written until `init`.
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let agebox_dir = Self::agebox_dir(custom_path)?;
        let config_path = agebox_dir.join(CONFIG_FILE_NAME);

        let config = if config_path.exists() {
            let config_toml = fs::read_to_string(&config_path)?;
            toml::from_str(&config_toml)?
        } else {
            AppConfig::default()
        };

        Ok(Self {
            agebox_dir,
            config_path,
            config,
        })
    }
}
