//! Order intake errors.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::shared::DomainError;

/// Errors raised while validating an order intent.
///
/// Raised before any network call and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An offset value was zero or negative.
    #[error("{field} offset must be strictly positive, got {value}")]
    NonPositiveOffset {
        /// Which offset (e.g. "profit", "stop").
        field: String,
        /// Offending value.
        value: Decimal,
    },

    /// A timeout was zero.
    #[error("{field} must be greater than zero")]
    NonPositiveTimeout {
        /// Which timeout.
        field: String,
    },

    /// Limit price missing, zero or negative.
    #[error("Limit price must be strictly positive, got {price}")]
    InvalidLimitPrice {
        /// Offending price.
        price: Decimal,
    },

    /// A required payload field was absent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// A free-text payload value did not match any known option.
    #[error("Unknown value '{value}' for {field}")]
    UnknownValue {
        /// Field name.
        field: String,
        /// The unrecognized value.
        value: String,
    },

    /// A field failed domain validation (symbol, quantity).
    #[error("Invalid {field}: {message}")]
    InvalidField {
        /// Field name.
        field: String,
        /// Error details.
        message: String,
    },
}

impl From<DomainError> for ValidationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue { field, message } => Self::InvalidField { field, message },
            other => Self::InvalidField {
                field: "order".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::NonPositiveOffset {
            field: "profit".to_string(),
            value: Decimal::ZERO,
        };
        assert_eq!(
            err.to_string(),
            "profit offset must be strictly positive, got 0"
        );

        let err = ValidationError::UnknownValue {
            field: "offset_type".to_string(),
            value: "pips".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown value 'pips' for offset_type");
    }

    #[test]
    fn from_domain_error_keeps_field() {
        let err: ValidationError = DomainError::InvalidValue {
            field: "quantity".to_string(),
            message: "Order quantity must be positive".to_string(),
        }
        .into();
        assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "quantity"));
    }
}
