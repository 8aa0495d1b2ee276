//! Configuration module for the bracket engine.
//!
//! YAML configuration with `${VAR}` / `${VAR:-default}` environment
//! interpolation. Every section has defaults, so an empty document is valid.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bracket_engine::config::load_config;
//!
//! let config = load_config(Some("config.yaml"))?;
//! println!("fill poll: {}ms", config.monitoring.fill_poll_interval_ms);
//! ```

mod defaults;
mod monitoring;
mod observability;
mod paper_broker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::DefaultsConfig;
pub use monitoring::{LegPriority, MonitoringConfig};
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use paper_broker::PaperBrokerConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Poll cadence and exit-leg policy.
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Placement defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Simulated broker used by the binary.
    #[serde(default)]
    pub paper_broker: PaperBrokerConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .monitoring
        .validate()
        .map_err(ConfigError::ValidationError)?;

    if config.defaults.fill_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "defaults.fill_timeout_secs must be positive".to_string(),
        ));
    }
    if config.defaults.confirmation_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "defaults.confirmation_timeout_secs must be positive".to_string(),
        ));
    }

    if config.paper_broker.default_price <= rust_decimal::Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "paper_broker.default_price must be positive".to_string(),
        ));
    }
    if config.paper_broker.step_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "paper_broker.step_interval_ms must be positive".to_string(),
        ));
    }

    let valid_formats = ["json", "pretty", "compact"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    if config.observability.metrics.enabled
        && config
            .observability
            .metrics
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        return Err(ConfigError::ValidationError(format!(
            "observability.metrics.listen_addr is not a socket address: {}",
            config.observability.metrics.listen_addr
        )));
    }

    Ok(())
}
