//! # Recurring Property Tax
//!
//! `liability = assessed_rental_value * (municipal + departmental + regional) / 100`.
//! A rate component the jurisdiction does not supply takes its documented
//! default instead of failing validation.

use fisc_core::{Rate, TaxCategory, TaxInput, ValidationError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rule::{check_non_negative, mismatched_input, Calculation};

/// Fallback rate components, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRates {
    /// Municipal component.
    pub municipal: Rate,
    /// Departmental component.
    pub departmental: Rate,
    /// Regional component.
    pub regional: Rate,
}

impl Default for DefaultRates {
    fn default() -> Self {
        Self {
            municipal: Rate::percent(dec!(23.48)),
            departmental: Rate::percent(dec!(15.09)),
            regional: Rate::percent(dec!(2.76)),
        }
    }
}

/// Recurring property tax over an assessed rental value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurringPropertyTax {
    defaults: DefaultRates,
}

impl RecurringPropertyTax {
    /// Tax with custom fallback rates.
    pub fn new(defaults: DefaultRates) -> Self {
        Self { defaults }
    }

    /// The fallback rates.
    pub fn defaults(&self) -> &DefaultRates {
        &self.defaults
    }
}

impl Calculation for RecurringPropertyTax {
    fn category(&self) -> TaxCategory {
        TaxCategory::RecurringProperty
    }

    fn validate(&self, input: &TaxInput) -> Result<(), ValidationError> {
        let TaxInput::RecurringProperty(p) = input else {
            return Err(ValidationError::CategoryMismatch {
                expected: TaxCategory::RecurringProperty,
                actual: input.category(),
            });
        };
        check_non_negative("assessed_rental_value", p.assessed_rental_value)?;
        let supplied = [
            ("rates.municipal", p.rates.municipal),
            ("rates.departmental", p.rates.departmental),
            ("rates.regional", p.rates.regional),
        ];
        for (field, rate) in supplied {
            match rate {
                Some(r) if r.is_negative() => {
                    return Err(ValidationError::field(field, "must not be negative"))
                }
                Some(r) if r.value() > Decimal::ONE_HUNDRED => {
                    return Err(ValidationError::field(field, "must not exceed 100 percent"))
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn calculate(&self, input: &TaxInput) -> Decimal {
        let TaxInput::RecurringProperty(p) = input else {
            return mismatched_input(TaxCategory::RecurringProperty, input);
        };
        let total_percent = p.rates.municipal.unwrap_or(self.defaults.municipal).value()
            + p.rates.departmental.unwrap_or(self.defaults.departmental).value()
            + p.rates.regional.unwrap_or(self.defaults.regional).value();
        p.assessed_rental_value.value() * total_percent / Decimal::ONE_HUNDRED
    }
}
