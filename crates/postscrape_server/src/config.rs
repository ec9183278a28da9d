//! Server configuration: an optional RON file plus environment overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use postscrape_core::DEFAULT_MAX_CONCURRENT;
use postscrape_engine::ServiceSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read when present and no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "postscrape.ron";

pub const ENV_CONFIG_PATH: &str = "POSTSCRAPE_CONFIG";
pub const ENV_MAX_CONCURRENT: &str = "SCRAPER_MAX_CONCURRENT";
pub const ENV_CHROME_BIN: &str = "CHROME_BIN";
pub const ENV_BIND: &str = "POSTSCRAPE_BIND";
pub const ENV_HEADLESS: &str = "POSTSCRAPE_HEADLESS";
pub const ENV_LOG: &str = "POSTSCRAPE_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOverrides {
    pub headless: Option<bool>,
    pub chrome_executable: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Raising this above one is unsafe: all requests share one browser page.
    pub max_concurrent: usize,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub browser: BrowserOverrides,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8001".to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            log_level: "info".to_string(),
            log_file: None,
            browser: BrowserOverrides::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the process environment and working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        let path = match explicit {
            Some(path) => Some(path),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
        };
        Self::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Reads `path` (defaults when `None`), then applies overrides from `env`.
    pub fn load_from(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = env(ENV_MAX_CONCURRENT) {
            self.max_concurrent = parse_value(ENV_MAX_CONCURRENT, &value)?;
        }
        if let Some(value) = env(ENV_CHROME_BIN).filter(|value| !value.trim().is_empty()) {
            self.browser.chrome_executable = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = env(ENV_BIND) {
            self.bind = value.trim().to_string();
        }
        if let Some(value) = env(ENV_HEADLESS) {
            self.browser.headless = Some(parse_bool(ENV_HEADLESS, &value)?);
        }
        if let Some(value) = env(ENV_LOG) {
            self.log_level = value.trim().to_string();
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        parse_value("log_level", &self.log_level)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        let mut settings = ServiceSettings {
            max_concurrent: self.max_concurrent,
            ..ServiceSettings::default()
        };
        let browser = &mut settings.browser;
        if let Some(headless) = self.browser.headless {
            browser.headless = headless;
        }
        if let Some(path) = &self.browser.chrome_executable {
            browser.chrome_executable = Some(path.clone());
        }
        if let Some(user_agent) = &self.browser.user_agent {
            browser.user_agent = user_agent.clone();
        }
        browser.extra_args.extend(self.browser.extra_args.iter().cloned());
        settings
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
