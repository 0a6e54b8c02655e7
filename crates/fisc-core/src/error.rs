//! # Error Types
//!
//! Structured error hierarchy shared across the workspace. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! - Validation errors name the offending field and the violated constraint.
//! - Canonicalization errors carry the rejected float so the escaping value
//!   can be traced back to its source.

use thiserror::Error;

use crate::category::TaxCategory;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum FiscError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Input rejected before any arithmetic.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use a decimal string: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Calculation input failed a rule's validation predicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The input shape belongs to a different category than the rule.
    #[error("input of category {actual} cannot be evaluated by a {expected} rule")]
    CategoryMismatch {
        /// Category the rule evaluates.
        expected: TaxCategory,
        /// Category of the supplied input.
        actual: TaxCategory,
    },

    /// A field is present but violates its constraint.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Field name as it appears in the serialized input.
        field: &'static str,
        /// Constraint that was violated.
        reason: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidField`].
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_mismatch_display() {
        let err = ValidationError::CategoryMismatch {
            expected: TaxCategory::Wealth,
            actual: TaxCategory::Vat,
        };
        assert_eq!(
            err.to_string(),
            "input of category vat cannot be evaluated by a wealth rule"
        );
    }

    #[test]
    fn invalid_field_display() {
        let err = ValidationError::field("net_worth", "must not be negative");
        assert_eq!(err.to_string(), "invalid field `net_worth`: must not be negative");
    }

    #[test]
    fn validation_wraps_transparently() {
        let err: FiscError = ValidationError::field("year", "out of range").into();
        assert_eq!(err.to_string(), "invalid field `year`: out of range");
    }
}
