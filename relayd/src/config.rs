use purchase_relay::config::Config as PurchaseRelayConfig;
use serde::Deserialize;
use std::fs::File;

/// Environment variables that replace the Graph secrets from the config file.
pub const PIXEL_ID_ENV: &str = "META_PIXEL_ID";
pub const ACCESS_TOKEN_ENV: &str = "META_ACCESS_TOKEN";
pub const TEST_EVENT_CODE_ENV: &str = "META_TEST_EVENT_CODE";

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
    pub environment: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            sentry_dsn: None,
            environment: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
    pub purchase_relay: PurchaseRelayConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Non-empty variables replace the values loaded from the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let graph = &mut self.purchase_relay.graph;
        for (name, slot) in [
            (PIXEL_ID_ENV, &mut graph.pixel_id),
            (ACCESS_TOKEN_ENV, &mut graph.access_token),
            (TEST_EVENT_CODE_ENV, &mut graph.test_event_code),
        ] {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_metrics_prefix() -> String {
    "purchase_relay".into()
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}
