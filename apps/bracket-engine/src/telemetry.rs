//! Tracing Setup
//!
//! Installs the `tracing-subscriber` formatter chosen by
//! `observability.logging`. `RUST_LOG` overrides the configured level.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bracket_engine::telemetry::init_tracing;
//!
//! init_tracing(&config.observability.logging)?;
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Tracing initialization error.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The level string is not a valid filter directive.
    #[error("invalid log level '{level}': {message}")]
    InvalidLevel {
        /// Configured level.
        level: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber was already installed.
    #[error("tracing subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Build the env filter: `RUST_LOG` if set, otherwise the configured level.
///
/// # Errors
///
/// Returns `InvalidLevel` when the configured level does not parse.
pub fn build_env_filter(logging: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&logging.level).map_err(|e| TelemetryError::InvalidLevel {
        level: logging.level.clone(),
        message: e.to_string(),
    })
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error for a bad level or if a subscriber is already installed.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = build_env_filter(logging)?;
    let span_events = if logging.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events);

    let result = match logging.format.as_str() {
        "pretty" => builder.pretty().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.json().with_current_span(logging.include_spans).try_init(),
    };

    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}
