use merge_router::config::{Config as RouterConfig, ValidationError};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::Path;

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub merge_router: RouterConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.merge_router.validate()?;

        Ok(config)
    }

    /// Reads `MERGE_ENDPOINTS` and `MERGE_LISTEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_values(
            env::var("MERGE_ENDPOINTS").ok(),
            env::var("MERGE_LISTEN").ok(),
        )
    }

    fn from_env_values(
        endpoints: Option<String>,
        listen: Option<String>,
    ) -> Result<Self, ConfigError> {
        let endpoints = endpoints
            .filter(|endpoints| !endpoints.trim().is_empty())
            .ok_or(ConfigError::MissingEndpoints)?;
        let listen = listen.filter(|listen| !listen.is_empty());

        let merge_router = RouterConfig::from_endpoints(&endpoints, listen.as_deref())?;
        merge_router.validate()?;

        Ok(Config {
            common: CommonConfig::default(),
            merge_router,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("MERGE_ENDPOINTS is required (primary,secondary)")]
    MissingEndpoints,
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}
