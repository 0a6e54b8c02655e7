//! Corporate income tax: a reduced rate up to a profit ceiling, the normal
//! rate above it. Zero or negative profit owes nothing.

use fisc_core::{TaxCategory, TaxInput, ValidationError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::bracket::{Bracket, BracketSchedule};
use crate::rule::{check_range, mismatched_input, Calculation};

/// Two-bracket corporate income tax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorporateIncomeTax {
    schedule: BracketSchedule,
}

impl CorporateIncomeTax {
    /// Tax with `reduced_percent` up to `ceiling` and `normal_percent` above.
    pub fn new(ceiling: Decimal, reduced_percent: Decimal, normal_percent: Decimal) -> Self {
        Self {
            schedule: BracketSchedule::from_ascending(vec![
                Bracket::percent(Decimal::ZERO, reduced_percent),
                Bracket::percent(ceiling, normal_percent),
            ]),
        }
    }

    /// The bracket schedule.
    pub fn schedule(&self) -> &BracketSchedule {
        &self.schedule
    }
}

impl Default for CorporateIncomeTax {
    fn default() -> Self {
        Self::new(dec!(42500), dec!(15), dec!(25))
    }
}

impl Calculation for CorporateIncomeTax {
    fn category(&self) -> TaxCategory {
        TaxCategory::CorporateIncome
    }

    fn validate(&self, input: &TaxInput) -> Result<(), ValidationError> {
        match input {
            TaxInput::CorporateIncome(c) => check_range("taxable_profit", c.taxable_profit),
            other => Err(ValidationError::CategoryMismatch {
                expected: TaxCategory::CorporateIncome,
                actual: other.category(),
            }),
        }
    }

    fn calculate(&self, input: &TaxInput) -> Decimal {
        match input {
            TaxInput::CorporateIncome(c) => self.schedule.liability(c.taxable_profit.value()),
            other => mismatched_input(TaxCategory::CorporateIncome, other),
        }
    }
}
