//! # Rule Model
//!
//! A [`Rule`] is a named calculation unit: an id unique within a registry, a
//! human-readable name, a [`Calculation`] that owns the arithmetic and the
//! validation predicate, and optional [`RuleMetadata`] describing when and
//! where it applies.

use chrono::NaiveDate;
use fisc_core::{Amount, TaxCategory, TaxInput, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The arithmetic behind a rule.
///
/// Implementations are pure: no I/O, no interior mutation, no panics on
/// validated input. `calculate` is only ever called by [`Rule::evaluate`]
/// with input `validate` accepted, and performs no further checks. Input of
/// another category reaching `calculate` is a caller bug: it panics in debug
/// builds and yields zero in release builds.
pub trait Calculation: Send + Sync + fmt::Debug {
    /// Category of input this calculation evaluates.
    fn category(&self) -> TaxCategory;

    /// Reject malformed input before any arithmetic is attempted.
    fn validate(&self, input: &TaxInput) -> Result<(), ValidationError>;

    /// Compute the liability for validated input. Never negative.
    fn calculate(&self, input: &TaxInput) -> Decimal;
}

/// Applicability metadata. Missing bounds are unbounded on that side; both
/// bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// First day the rule applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    /// Last day the rule applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_until: Option<NaiveDate>,
    /// Region the rule is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl RuleMetadata {
    /// True if `date` falls inside the effective window.
    pub fn applies_at(&self, date: NaiveDate) -> bool {
        if self.effective_from.is_some_and(|from| date < from) {
            return false;
        }
        if self.effective_until.is_some_and(|until| date > until) {
            return false;
        }
        true
    }
}

/// A registered calculation unit.
///
/// Cloning is cheap: the calculation is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    name: String,
    metadata: RuleMetadata,
    calculation: Arc<dyn Calculation>,
}

impl Rule {
    /// Create a rule with empty metadata.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        calculation: impl Calculation + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metadata: RuleMetadata::default(),
            calculation: Arc::new(calculation),
        }
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: RuleMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tax category.
    pub fn category(&self) -> TaxCategory {
        self.calculation.category()
    }

    /// Applicability metadata.
    pub fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    /// True if the rule's window contains `date`.
    pub fn is_applicable_at(&self, date: NaiveDate) -> bool {
        self.metadata.applies_at(date)
    }

    /// Run the validation predicate.
    pub fn validate(&self, input: &TaxInput) -> Result<(), ValidationError> {
        let category = self.category();
        if input.category() != category {
            return Err(ValidationError::CategoryMismatch {
                expected: category,
                actual: input.category(),
            });
        }
        self.calculation.validate(input)
    }

    /// Boolean form of [`Rule::validate`].
    pub fn is_valid(&self, input: &TaxInput) -> bool {
        self.validate(input).is_ok()
    }

    /// Validate, then calculate.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; no arithmetic runs in that case.
    pub fn evaluate(&self, input: &TaxInput) -> Result<Amount, ValidationError> {
        self.validate(input)?;
        Ok(Amount::new(self.calculation.calculate(input)))
    }

    /// Serializable description of the rule.
    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Reject amounts outside the supported magnitude.
pub(crate) fn check_range(field: &'static str, amount: Amount) -> Result<(), ValidationError> {
    if amount.is_within_supported_range() {
        Ok(())
    } else {
        Err(ValidationError::field(field, "exceeds the supported magnitude"))
    }
}

/// Reject negative or out-of-range amounts.
pub(crate) fn check_non_negative(
    field: &'static str,
    amount: Amount,
) -> Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(ValidationError::field(field, "must not be negative"));
    }
    check_range(field, amount)
}

/// Liability for input `calculate` should never have received. Panics in
/// debug builds.
pub(crate) fn mismatched_input(expected: TaxCategory, input: &TaxInput) -> Decimal {
    if cfg!(debug_assertions) {
        unreachable!(
            "{expected} calculation given unvalidated {} input",
            input.category()
        );
    }
    Decimal::ZERO
}

/// Serializable view of a [`Rule`], without its calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    /// Rule id.
    pub id: String,
    /// Rule name.
    pub name: String,
    /// Tax category.
    pub category: TaxCategory,
    /// Applicability metadata.
    #[serde(flatten)]
    pub metadata: RuleMetadata,
}
