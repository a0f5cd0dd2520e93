mod upstream;

pub use upstream::{parse_duration_string, UpstreamConfig};

use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockReadGuard};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_PORT: u16 = 7071;

/// Environment variables injected by the hosting platform.
pub const WEB_SERVICE_URL_VAR: &str = "web_service_url";
pub const API_KEY_VAR: &str = "api_key";

static ENV_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_config_file")]
    pub config_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            config_file: default_config_file(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_config_file() -> String {
    DEFAULT_CONFIG_FILE.to_string()
}

#[derive(Debug)]
pub struct ConfigHolder {
    config: RwLock<Config>,
}

impl ConfigHolder {
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Re-read the file the current config was loaded from.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let path = self.config.read().server.config_file.clone();
        let new_config = Config::from_file(&path)?;
        *self.config.write() = new_config;
        Ok(())
    }

    pub fn get(&self) -> RwLockReadGuard<'_, Config> {
        self.config.read()
    }

    pub fn snapshot(&self) -> Config {
        self.config.read().clone()
    }
}

impl Config {
    /// Load from `path` if it exists, otherwise from the environment alone.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::from_env();
            config.server.config_file = path.to_string();
            Ok(config)
        }
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let mut config: Config = serde_yaml::from_str(&raw)?;
        config.server.config_file = path.to_string();
        config.substitute_env();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Config {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
        };
        config.apply_env_overrides();
        config
    }

    pub fn substitute_env_in_string(value: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(value, |caps: &Captures| {
                std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
            })
            .into_owned()
    }

    /// Copy with secrets masked, for the config endpoint.
    pub fn redacted(&self) -> Self {
        Self {
            server: self.server.clone(),
            upstream: self.upstream.redacted(),
        }
    }

    fn substitute_env(&mut self) {
        let upstream = &mut self.upstream;
        for value in [
            &mut upstream.web_service_url,
            &mut upstream.api_key,
            &mut upstream.timeout,
        ]
        .into_iter()
        .flatten()
        {
            *value = Self::substitute_env_in_string(value);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(WEB_SERVICE_URL_VAR) {
            self.upstream.web_service_url = Some(url);
        }
        if let Ok(key) = std::env::var(API_KEY_VAR) {
            self.upstream.api_key = Some(key);
        }
    }
}
