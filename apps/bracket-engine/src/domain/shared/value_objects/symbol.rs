//! Symbol value object for instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Maximum accepted ticker length.
const MAX_SYMBOL_LEN: usize = 10;

/// An equity ticker symbol, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is trimmed and normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the symbol for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if symbol is empty, too long, or contains invalid characters.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol cannot be empty".to_string(),
            });
        }

        if self.0.len() > MAX_SYMBOL_LEN {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol exceeds maximum length".to_string(),
            });
        }

        // Class shares use a dot (BRK.B)
        if !self.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol contains invalid characters".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_new_normalizes_case_and_whitespace() {
        assert_eq!(Symbol::new(" msft ").as_str(), "MSFT");
    }

    #[test]
    fn symbol_validate_accepts_tickers() {
        assert!(Symbol::new("AAPL").validate().is_ok());
        assert!(Symbol::new("BRK.B").validate().is_ok());
    }

    #[test]
    fn symbol_validate_empty() {
        assert!(Symbol::new("").validate().is_err());
        assert!(Symbol::new("   ").validate().is_err());
    }

    #[test]
    fn symbol_validate_invalid_chars() {
        assert!(Symbol::new("AA PL").validate().is_err());
        assert!(Symbol::new("AAPL$").validate().is_err());
    }

    #[test]
    fn symbol_validate_too_long() {
        assert!(Symbol::new("ABCDEFGHIJK").validate().is_err());
    }
}
