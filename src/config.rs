use crate::error::{Error, Result};
use crate::policy::{RateLimit, RetryPolicy};
use log::LevelFilter;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "LINECUE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "linecue.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub addr: SocketAddr,
    pub store_path: String,
    pub max_body_bytes: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 5026)),
            store_path: "messages.txt".to_string(),
            // 1_048_576 bytes = 1MB
            max_body_bytes: 1_048_576,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub endpoint: String,
    #[serde(flatten)]
    pub retry: RetryPolicy,
    pub max_threads: RateLimit,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        ProducerConfig {
            endpoint: "http://127.0.0.1:5026/messages/send".to_string(),
            retry: RetryPolicy::default(),
            max_threads: RateLimit::new(5).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub endpoint: String,
    pub max_threads: RateLimit,
    pub poll_interval_ms: u64,
    pub workers: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            endpoint: "http://127.0.0.1:5026/messages/receive".to_string(),
            max_threads: RateLimit::new(3).unwrap_or_default(),
            poll_interval_ms: 2000,
            workers: 10,
        }
    }
}

impl ConsumerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level
            .parse()
            .map_err(|_| Error::Config(format!("unknown log level '{}'", self.level)))
    }
}

pub fn get_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();

    let config_toml = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("could not read {}: {e}", path.display())))?;

    parse_config(&config_toml)
}

pub fn parse_config(config_toml: &str) -> Result<Config> {
    toml::from_str(config_toml).map_err(|e| Error::Config(e.to_string()))
}

// a missing default file yields the built-in defaults
pub fn load_config() -> Result<Config> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => get_config(path),
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => get_config(DEFAULT_CONFIG_PATH),
        Err(_) => Ok(Config::default()),
    }
}

pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(cfg.level_filter()?)
        .env()
        .init()
        .map_err(|e| Error::Config(format!("could not initialise logger: {e}")))
}
