use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Where the local store database lives. Unset means the XDG data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LinksConfig {
    pub console_base_url: Option<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            console_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub links: LinksConfig,
}

impl ConsoleConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::new(format!("TOML parse error: {err}")))
    }

    /// Read the config file (explicit path, TRIAGE_CONFIG, then the XDG
    /// chain), apply env overrides, and validate. No file means defaults.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = resolve_config_path(config_override);
        let mut config = if let Some(ref path) = path {
            let raw = fs::read_to_string(path).map_err(|err| {
                ConfigError::new(format!("Unable to read config '{}': {err}", path.display()))
            })?;
            Self::from_toml_str(&raw)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("TRIAGE_DATA_DIR") {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                self.storage.data_dir = Some(PathBuf::from(trimmed));
            }
        }
        if let Ok(level) = env::var("TRIAGE_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(file) = env::var("TRIAGE_LOG_FILE") {
            let trimmed = file.trim();
            if !trimmed.is_empty() {
                self.logging.file = Some(PathBuf::from(trimmed));
            }
        }
        if let Ok(url) = env::var("TRIAGE_CONSOLE_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                self.links.console_base_url = Some(trimmed.to_string());
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.logging.level).map_err(|err| {
            ConfigError::new(format!(
                "Invalid logging.level '{}': {err}",
                self.logging.level
            ))
        })?;

        if let Some(url) = &self.links.console_base_url {
            Url::parse(url).map_err(|err| {
                ConfigError::new(format!("Invalid links.console-base-url '{url}': {err}"))
            })?;
        }

        Ok(())
    }

    /// Directory holding the sqlite store. Explicit config wins, then the
    /// XDG data chain, then the system temp dir.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.data_dir {
            return dir.clone();
        }
        if let Some(data_home) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(data_home).join("triage-console");
        }
        if let Some(home) = env::var_os("HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("triage-console");
        }
        env::temp_dir().join("triage-console")
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("console.db")
    }
}

/// Resolve which config file would be read: explicit override, then the
/// TRIAGE_CONFIG variable, then the first existing XDG candidate.
pub fn resolve_config_path(config_override: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = config_override {
        return Some(path);
    }
    if let Some(path) = env::var_os("TRIAGE_CONFIG").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }

    let mut candidates = Vec::new();
    if let Some(home) = env::var_os("XDG_CONFIG_HOME").filter(|value| !value.is_empty()) {
        candidates.push(PathBuf::from(home).join("triage-console").join("config.toml"));
    } else if let Some(home) = env::var_os("HOME").filter(|value| !value.is_empty()) {
        candidates.push(
            PathBuf::from(home)
                .join(".config")
                .join("triage-console")
                .join("config.toml"),
        );
    }
    candidates.push(PathBuf::from("/etc/triage-console/config.toml"));

    candidates.into_iter().find(|path| path.exists())
}
