//! # Wealth Tax on Real Property
//!
//! Five ascending marginal brackets over net taxable real-property wealth.
//! The first bracket's lower bound is also the exemption threshold: net worth
//! at or below it owes exactly zero.

use fisc_core::{TaxCategory, TaxInput, ValidationError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::bracket::{Bracket, BracketSchedule};
use crate::rule::{check_non_negative, mismatched_input, Calculation};

/// Progressive wealth tax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WealthTax {
    schedule: BracketSchedule,
}

impl WealthTax {
    /// Wealth tax over a custom schedule.
    pub fn new(schedule: BracketSchedule) -> Self {
        Self { schedule }
    }

    /// The bracket schedule.
    pub fn schedule(&self) -> &BracketSchedule {
        &self.schedule
    }
}

impl Default for WealthTax {
    /// 0.5 / 0.7 / 1 / 1.25 / 1.5 % above 800k / 1.3M / 2.57M / 5M / 10M.
    fn default() -> Self {
        Self::new(BracketSchedule::from_ascending(vec![
            Bracket::percent(dec!(800000), dec!(0.5)),
            Bracket::percent(dec!(1300000), dec!(0.7)),
            Bracket::percent(dec!(2570000), dec!(1)),
            Bracket::percent(dec!(5000000), dec!(1.25)),
            Bracket::percent(dec!(10000000), dec!(1.5)),
        ]))
    }
}

impl Calculation for WealthTax {
    fn category(&self) -> TaxCategory {
        TaxCategory::Wealth
    }

    fn validate(&self, input: &TaxInput) -> Result<(), ValidationError> {
        match input {
            TaxInput::Wealth(w) => check_non_negative("net_worth", w.net_worth),
            other => Err(ValidationError::CategoryMismatch {
                expected: TaxCategory::Wealth,
                actual: other.category(),
            }),
        }
    }

    fn calculate(&self, input: &TaxInput) -> Decimal {
        match input {
            TaxInput::Wealth(w) => self.schedule.liability(w.net_worth.value()),
            other => mismatched_input(TaxCategory::Wealth, other),
        }
    }
}
