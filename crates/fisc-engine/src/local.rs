//! # Local Calculator
//!
//! The last-resort computation path, used when no authority produced an
//! answer.
//!
//! 1. If the registry holds a rule for the request's category that applies
//!    on 1 January of the fiscal year, that rule is evaluated.
//! 2. Otherwise a simplified flat formula is used where one exists:
//!    VAT at 20 % of the net amount, corporate income at 25 % of profit.
//! 3. Otherwise there is no local computation for the category.
//!
//! The same resolution drives pre-flight validation, so input a local rule
//! would reject never reaches an external authority.

use std::sync::Arc;

use fisc_core::{Amount, TaxCalculationRequest, TaxInput, ValidationError};
use fisc_rules::{Rule, RuleRegistry};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Flat VAT rate of the simplified formula.
pub const SIMPLIFIED_VAT_RATE: Decimal = dec!(0.20);

/// Flat corporate income rate of the simplified formula.
pub const SIMPLIFIED_CORPORATE_RATE: Decimal = dec!(0.25);

/// Registry-backed local computation with simplified fallbacks.
#[derive(Debug, Clone)]
pub struct LocalCalculator {
    registry: Arc<RwLock<RuleRegistry>>,
}

impl LocalCalculator {
    /// Calculator reading rules from `registry`.
    pub fn new(registry: Arc<RwLock<RuleRegistry>>) -> Self {
        Self { registry }
    }

    /// Rule that would compute `request` locally, if any.
    pub fn rule_for(&self, request: &TaxCalculationRequest) -> Option<Rule> {
        let as_of = request.as_of();
        self.registry
            .read()
            .resolve_for(request.category(), as_of)
            .cloned()
    }

    /// Check `request` against the local rule or simplified formula.
    ///
    /// Categories with neither pass through unchecked; the authorities are
    /// the only judges there.
    ///
    /// # Errors
    ///
    /// The [`ValidationError`] of whichever check rejected the input.
    pub fn validate(&self, request: &TaxCalculationRequest) -> Result<(), ValidationError> {
        if request.as_of().is_none() {
            return Err(ValidationError::field("year", "outside the supported calendar range"));
        }
        match self.rule_for(request) {
            Some(rule) => rule.validate(&request.input),
            None => validate_simplified(&request.input),
        }
    }

    /// Compute `request` locally.
    ///
    /// Returns `Ok(None)` when the category has neither a rule nor a
    /// simplified formula.
    ///
    /// # Errors
    ///
    /// The validation failure if the input is rejected.
    pub fn calculate(
        &self,
        request: &TaxCalculationRequest,
    ) -> Result<Option<Amount>, ValidationError> {
        if let Some(rule) = self.rule_for(request) {
            tracing::debug!(rule_id = rule.id(), "computing with local rule");
            return rule.evaluate(&request.input).map(Some);
        }
        validate_simplified(&request.input)?;
        Ok(simplified_liability(&request.input).map(Amount::new))
    }
}

/// Flat-rate liability for categories that have a simplified formula.
pub fn simplified_liability(input: &TaxInput) -> Option<Decimal> {
    match input {
        TaxInput::Vat(v) => Some(v.net_amount.value() * SIMPLIFIED_VAT_RATE),
        TaxInput::CorporateIncome(c) => {
            Some(c.taxable_profit.value().max(Decimal::ZERO) * SIMPLIFIED_CORPORATE_RATE)
        }
        _ => None,
    }
}

fn validate_simplified(input: &TaxInput) -> Result<(), ValidationError> {
    let (field, amount, allow_negative) = match input {
        TaxInput::Vat(v) => ("net_amount", v.net_amount, false),
        TaxInput::CorporateIncome(c) => ("taxable_profit", c.taxable_profit, true),
        _ => return Ok(()),
    };
    if !allow_negative && amount.is_negative() {
        return Err(ValidationError::field(field, "must not be negative"));
    }
    if !amount.is_within_supported_range() {
        return Err(ValidationError::field(field, "exceeds the supported magnitude"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisc_core::{CorporateIncomeInput, SciInput, VatInput, WealthInput};
    use fisc_rules::standard_rules;

    fn calculator(rules: Vec<Rule>) -> LocalCalculator {
        LocalCalculator::new(Arc::new(RwLock::new(RuleRegistry::with_rules(rules))))
    }

    fn request(input: TaxInput, year: i32) -> TaxCalculationRequest {
        TaxCalculationRequest::new(input, year)
    }

    fn wealth(net_worth: Decimal) -> TaxInput {
        TaxInput::Wealth(WealthInput {
            net_worth: Amount::new(net_worth),
        })
    }

    #[test]
    fn registered_rule_takes_precedence() {
        let calc = calculator(standard_rules());
        let amount = calc.calculate(&request(wealth(dec!(1500000)), 2024)).unwrap();
        assert_eq!(amount.map(|a| a.value()), Some(dec!(3900)));
    }

    #[test]
    fn rule_outside_window_is_not_used() {
        let calc = calculator(standard_rules());
        assert_eq!(calc.calculate(&request(wealth(dec!(1500000)), 2023)).unwrap(), None);
    }

    #[test]
    fn simplified_vat_and_corporate() {
        let calc = calculator(vec![]);
        let vat = TaxInput::Vat(VatInput {
            net_amount: Amount::new(dec!(1000)),
        });
        assert_eq!(
            calc.calculate(&request(vat, 2024)).unwrap().map(|a| a.value()),
            Some(dec!(200))
        );
        let cit = TaxInput::CorporateIncome(CorporateIncomeInput {
            taxable_profit: Amount::new(dec!(100000)),
        });
        assert_eq!(
            calc.calculate(&request(cit, 2024)).unwrap().map(|a| a.value()),
            Some(dec!(25000))
        );
    }

    #[test]
    fn corporate_rule_beats_simplified_formula() {
        let calc = calculator(standard_rules());
        let cit = TaxInput::CorporateIncome(CorporateIncomeInput {
            taxable_profit: Amount::new(dec!(100000)),
        });
        assert_eq!(
            calc.calculate(&request(cit, 2024)).unwrap().map(|a| a.value()),
            Some(dec!(20750))
        );
    }

    #[test]
    fn category_without_computation_yields_none() {
        let calc = calculator(standard_rules());
        let sci = TaxInput::Sci(SciInput {
            taxable_income: Amount::new(dec!(50000)),
        });
        assert_eq!(calc.calculate(&request(sci, 2024)).unwrap(), None);
    }

    #[test]
    fn validate_uses_rule_then_simplified_checks() {
        let calc = calculator(standard_rules());
        assert!(calc.validate(&request(wealth(dec!(-1)), 2024)).is_err());
        let vat = TaxInput::Vat(VatInput {
            net_amount: Amount::new(dec!(-1)),
        });
        assert_eq!(
            calc.validate(&request(vat, 2024)),
            Err(ValidationError::field("net_amount", "must not be negative"))
        );
    }

    #[test]
    fn unrepresentable_year_is_rejected() {
        let calc = calculator(vec![]);
        assert!(calc.validate(&request(wealth(dec!(1)), i32::MAX)).is_err());
    }
}
