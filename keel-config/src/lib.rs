//! Layered configuration loading utilities.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use config::{Config, ConfigError, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

mod deserializer;

/// Root application configuration deserialized from layered sources.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub brokerages: Vec<BrokerageConfig>,
    #[serde(default)]
    pub margin_call: MarginCallConfig,
}

/// Values the job queue reads before building a packet.
#[derive(Debug, Deserialize, Clone)]
pub struct JobConfig {
    /// Run a live session instead of a backtest.
    #[serde(default)]
    pub live_mode: bool,
    /// Declared type of the brokerage for live sessions; the paper brokerage when unset.
    #[serde(default)]
    pub live_mode_brokerage: Option<String>,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub user_id: i32,
    #[serde(default = "default_algorithm_location")]
    pub algorithm_location: PathBuf,
    #[serde(default = "default_starting_capital")]
    pub starting_capital: Decimal,
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

/// Connection settings advertised by a configured brokerage.
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct BrokerageConfig {
    /// Declared type identifier, matched exactly against the live job's brokerage.
    pub name: String,
    #[serde(default, deserialize_with = "deserializer::stringified_map::deserialize")]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarginCallConfig {
    /// Upper bound on waiting for one liquidation order; `0` waits indefinitely.
    #[serde(default = "default_order_timeout_secs")]
    pub order_timeout_secs: u64,
    #[serde(default)]
    pub on_timeout: OrderTimeoutPolicy,
}

/// What a margin call does with an order that never reaches a terminal state.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderTimeoutPolicy {
    /// Stop liquidating and report the stalled order.
    #[default]
    Abort,
    /// Move on to the next candidate.
    Skip,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_path: None,
            job: JobConfig::default(),
            brokerages: Vec::new(),
            margin_call: MarginCallConfig::default(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            live_mode: false,
            live_mode_brokerage: None,
            channel: String::new(),
            user_id: 0,
            algorithm_location: default_algorithm_location(),
            starting_capital: default_starting_capital(),
            data_source: default_data_source(),
        }
    }
}

impl Default for MarginCallConfig {
    fn default() -> Self {
        Self {
            order_timeout_secs: default_order_timeout_secs(),
            on_timeout: OrderTimeoutPolicy::default(),
        }
    }
}

impl MarginCallConfig {
    /// Effective per-order wait bound, `None` when disabled.
    pub fn order_timeout(&self) -> Option<std::time::Duration> {
        (self.order_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.order_timeout_secs))
    }
}

impl AppConfig {
    /// Parse a single TOML document, applying the same defaults as [`load_config`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        config
            .try_deserialize()
            .map_err(|err: ConfigError| err.into())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_algorithm_location() -> PathBuf {
    PathBuf::from("algorithm.bin")
}

fn default_starting_capital() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_data_source() -> String {
    "local".to_string()
}

fn default_order_timeout_secs() -> u64 {
    30
}

/// Loads configuration from `./config`, see [`load_config_from`].
pub fn load_config(env: Option<&str>) -> Result<AppConfig> {
    load_config_from(Path::new("config"), env)
}

/// Loads configuration by merging files and environment variables.
///
/// Sources (lowest to highest precedence):
/// 1. `{base}/default.toml`
/// 2. `{base}/{environment}.toml` (if `environment` is Some)
/// 3. `{base}/local.toml` (optional, ignored in git)
/// 4. Environment variables prefixed with `KEEL__`
pub fn load_config_from(base_path: &Path, env: Option<&str>) -> Result<AppConfig> {
    let mut builder =
        Config::builder().add_source(File::from(base_path.join("default.toml")).required(true));
    if let Some(env_name) = env {
        builder = builder
            .add_source(File::from(base_path.join(format!("{env_name}.toml"))).required(false));
    }

    builder = builder.add_source(File::from(base_path.join("local.toml")).required(false));

    builder = builder.add_source(
        Environment::with_prefix("KEEL")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .ignore_empty(true),
    );

    let config = builder.build()?;
    config
        .try_deserialize()
        .map_err(|err: ConfigError| err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.log_level, "info");
        assert!(!config.job.live_mode);
        assert!(config.job.live_mode_brokerage.is_none());
        assert_eq!(config.job.starting_capital, dec!(10000));
        assert_eq!(config.job.data_source, "local");
        assert!(config.brokerages.is_empty());
        assert_eq!(config.margin_call.order_timeout_secs, 30);
        assert_eq!(config.margin_call.on_timeout, OrderTimeoutPolicy::Abort);
    }

    #[test]
    fn brokerage_settings_are_stringified() {
        let config = AppConfig::from_toml_str(
            r#"
            [job]
            live_mode = true
            live_mode_brokerage = "InteractiveBrokersBrokerage"
            channel = "local-channel"
            user_id = 42

            [[brokerages]]
            name = "InteractiveBrokersBrokerage"
            [brokerages.data]
            account = "DU123456"
            port = 4002
            paper = true
            "#,
        )
        .unwrap();
        assert!(config.job.live_mode);
        assert_eq!(config.job.user_id, 42);
        assert_eq!(config.brokerages.len(), 1);
        let brokerage = &config.brokerages[0];
        assert_eq!(brokerage.name, "InteractiveBrokersBrokerage");
        assert_eq!(brokerage.data["account"], "DU123456");
        assert_eq!(brokerage.data["port"], "4002");
        assert_eq!(brokerage.data["paper"], "true");
    }

    #[test]
    fn zero_timeout_disables_the_bound() {
        let config = AppConfig::from_toml_str(
            r#"
            [margin_call]
            order_timeout_secs = 0
            on_timeout = "skip"
            "#,
        )
        .unwrap();
        assert!(config.margin_call.order_timeout().is_none());
        assert_eq!(config.margin_call.on_timeout, OrderTimeoutPolicy::Skip);
        assert_eq!(
            MarginCallConfig::default().order_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
    }
}
