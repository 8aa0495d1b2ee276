//! Crate-level error taxonomy.
//!
//! Every library error funnels into [`EngineError`], which exposes a stable
//! [`ErrorCode`] for callers that report errors outside the process.
//!
//! | Code | Raised when |
//! |------|-------------|
//! | `INVALID_REQUEST` | Placement payload missing fields or using unknown values |
//! | `INVALID_ORDER_PARAMS` | Offsets, timeouts, quantity or prices out of range |
//! | `ORDER_REJECTED` | Broker refused the entry order |
//! | `BROKER_UNAVAILABLE` | Connection error or rate limit at placement |
//! | `ORDER_NOT_FOUND` | Broker does not know the order |
//! | `ALREADY_MONITORED` | Second monitor for one entry order |
//! | `SHUTTING_DOWN` | Registration after shutdown began |
//! | `CONFIG_INVALID` | Configuration could not be loaded |
//! | `INTERNAL_ERROR` | Anything else |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::BrokerError;
use crate::application::services::SchedulerError;
use crate::application::use_cases::PlacementError;
use crate::config::ConfigError;
use crate::domain::order_intent::ValidationError;

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed placement payload.
    InvalidRequest,
    /// Order parameters out of range.
    InvalidOrderParams,
    /// Broker refused the order.
    OrderRejected,
    /// Broker temporarily unreachable or throttling.
    BrokerUnavailable,
    /// Broker does not know the order.
    OrderNotFound,
    /// The entry order already has a monitor.
    AlreadyMonitored,
    /// The scheduler no longer accepts work.
    ShuttingDown,
    /// Bad configuration.
    ConfigInvalid,
    /// Unexpected failure.
    InternalError,
}

impl ErrorCode {
    /// Reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidOrderParams => "INVALID_ORDER_PARAMS",
            Self::OrderRejected => "ORDER_REJECTED",
            Self::BrokerUnavailable => "BROKER_UNAVAILABLE",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::AlreadyMonitored => "ALREADY_MONITORED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether resubmitting the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BrokerUnavailable)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Any error the engine surfaces.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Intake validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Entry placement failed.
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// Monitor registration failed.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Configuration failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => validation_code(e),
            Self::Placement(e) => match e {
                PlacementError::Validation(v) => validation_code(v),
                PlacementError::Quote(b) | PlacementError::Entry(b) => broker_code(b),
                PlacementError::NotMonitored { source, .. } => scheduler_code(source),
            },
            Self::Scheduler(e) => scheduler_code(e),
            Self::Config(_) => ErrorCode::ConfigInvalid,
        }
    }
}

const fn validation_code(error: &ValidationError) -> ErrorCode {
    match error {
        ValidationError::MissingField { .. } | ValidationError::UnknownValue { .. } => {
            ErrorCode::InvalidRequest
        }
        ValidationError::NonPositiveOffset { .. }
        | ValidationError::NonPositiveTimeout { .. }
        | ValidationError::InvalidLimitPrice { .. }
        | ValidationError::InvalidField { .. } => ErrorCode::InvalidOrderParams,
    }
}

const fn broker_code(error: &BrokerError) -> ErrorCode {
    match error {
        BrokerError::OrderRejected { .. } => ErrorCode::OrderRejected,
        BrokerError::ConnectionError { .. } | BrokerError::RateLimited => {
            ErrorCode::BrokerUnavailable
        }
        BrokerError::OrderNotFound { .. } => ErrorCode::OrderNotFound,
        BrokerError::Unknown { .. } => ErrorCode::InternalError,
    }
}

const fn scheduler_code(error: &SchedulerError) -> ErrorCode {
    match error {
        SchedulerError::AlreadyMonitored { .. } => ErrorCode::AlreadyMonitored,
        SchedulerError::ShuttingDown => ErrorCode::ShuttingDown,
        SchedulerError::NothingToMonitor { .. } | SchedulerError::InvalidMonitor(_) => {
            ErrorCode::InvalidOrderParams
        }
        SchedulerError::InvalidConfig(_) => ErrorCode::ConfigInvalid,
        SchedulerError::OutcomeLost { .. } => ErrorCode::InternalError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn validation_codes() {
        let missing: EngineError = ValidationError::MissingField {
            field: "symbol".into(),
        }
        .into();
        assert_eq!(missing.code(), ErrorCode::InvalidRequest);

        let offset: EngineError = ValidationError::NonPositiveOffset {
            field: "profit".into(),
            value: Decimal::ZERO,
        }
        .into();
        assert_eq!(offset.code(), ErrorCode::InvalidOrderParams);
    }

    #[test]
    fn placement_codes_follow_broker_error() {
        let rejected: EngineError = PlacementError::Entry(BrokerError::OrderRejected {
            reason: "halted".into(),
        })
        .into();
        assert_eq!(rejected.code(), ErrorCode::OrderRejected);
        assert!(!rejected.code().is_retryable());

        let throttled: EngineError = PlacementError::Entry(BrokerError::RateLimited).into();
        assert_eq!(throttled.code(), ErrorCode::BrokerUnavailable);
        assert!(throttled.code().is_retryable());
    }

    #[test]
    fn scheduler_codes() {
        let err: EngineError = SchedulerError::ShuttingDown.into();
        assert_eq!(err.code(), ErrorCode::ShuttingDown);
        assert_eq!(err.code().to_string(), "SHUTTING_DOWN");
    }
}
