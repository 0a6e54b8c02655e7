//! Rule and schedule errors.

use chrono::NaiveDate;
use fisc_core::ValidationError;
use thiserror::Error;

/// Errors from rule resolution and evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// No rule with this id, or the current rule is outside its window at
    /// `as_of`. The registry does not tell the two apart.
    #[error("rule {rule_id} not found or not applicable{}", .as_of.map(|d| format!(" at {d}")).unwrap_or_default())]
    NotFound {
        /// Requested rule id.
        rule_id: String,
        /// Date the rule was resolved for, if any.
        as_of: Option<NaiveDate>,
    },

    /// The input failed the rule's validation predicate.
    #[error("invalid input for rule {rule_id}: {source}")]
    Validation {
        /// Rule that rejected the input.
        rule_id: String,
        /// Underlying validation failure.
        source: ValidationError,
    },
}

/// Errors constructing a bracket schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A schedule needs at least one bracket.
    #[error("bracket schedule must contain at least one bracket")]
    Empty,

    /// Lower bounds must be strictly ascending.
    #[error("bracket {index} lower bound is not above the previous bracket's")]
    NotAscending {
        /// Index of the offending bracket.
        index: usize,
    },

    /// Rates and bounds must not be negative.
    #[error("bracket {index} has a negative bound or rate")]
    Negative {
        /// Index of the offending bracket.
        index: usize,
    },
}
