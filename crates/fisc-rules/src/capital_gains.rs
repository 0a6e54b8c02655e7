//! # Capital Gains on Property Disposals
//!
//! ```text
//! gross = sale - purchase - acquisition_costs - disposal_costs - improvement_costs
//! net   = gross * (1 - abatement(holding_years))
//! tax   = net * rate
//! ```
//!
//! A non-positive gross gain owes nothing. The abatement accrues linearly per
//! year held beyond a minimum period and is total once the full-exemption
//! period is reached.

use fisc_core::{CapitalGainsInput, TaxCategory, TaxInput, ValidationError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rule::{check_non_negative, check_range, mismatched_input, Calculation};

/// Holding-period abatement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbatementSchedule {
    /// Years that must be exceeded before any abatement accrues.
    pub min_holding_years: u32,
    /// Percent abated per year beyond `min_holding_years`.
    pub annual_percent: Decimal,
    /// Holding period at which the gain is fully exempt.
    pub full_exemption_years: u32,
}

impl Default for AbatementSchedule {
    fn default() -> Self {
        Self {
            min_holding_years: 5,
            annual_percent: dec!(6),
            full_exemption_years: 22,
        }
    }
}

impl AbatementSchedule {
    /// Abated fraction of the gain, in `[0, 1]`.
    pub fn fraction(&self, holding_years: u32) -> Decimal {
        if holding_years >= self.full_exemption_years {
            return Decimal::ONE;
        }
        if holding_years <= self.min_holding_years {
            return Decimal::ZERO;
        }
        let accrued = Decimal::from(holding_years - self.min_holding_years) * self.annual_percent
            / Decimal::ONE_HUNDRED;
        accrued.min(Decimal::ONE)
    }
}

/// Flat-rate capital gains tax with holding-period abatement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapitalGainsTax {
    abatement: AbatementSchedule,
    rate: Decimal,
}

impl CapitalGainsTax {
    /// Tax at `rate` (a fraction) after `abatement`.
    pub fn new(abatement: AbatementSchedule, rate: Decimal) -> Self {
        Self { abatement, rate }
    }

    /// The abatement schedule.
    pub fn abatement(&self) -> &AbatementSchedule {
        &self.abatement
    }

    /// The flat rate as a fraction.
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Gain before abatement. May be negative.
    pub fn gross_gain(input: &CapitalGainsInput) -> Decimal {
        input.sale_price.value()
            - input.purchase_price.value()
            - input.acquisition_costs.value()
            - input.disposal_costs.value()
            - input.improvement_costs.value()
    }
}

impl Default for CapitalGainsTax {
    fn default() -> Self {
        Self::new(AbatementSchedule::default(), dec!(0.19))
    }
}

impl Calculation for CapitalGainsTax {
    fn category(&self) -> TaxCategory {
        TaxCategory::CapitalGains
    }

    fn validate(&self, input: &TaxInput) -> Result<(), ValidationError> {
        let cg = match input {
            TaxInput::CapitalGains(cg) => cg,
            other => {
                return Err(ValidationError::CategoryMismatch {
                    expected: TaxCategory::CapitalGains,
                    actual: other.category(),
                })
            }
        };
        for (field, price) in [("sale_price", cg.sale_price), ("purchase_price", cg.purchase_price)] {
            if price.value() <= Decimal::ZERO {
                return Err(ValidationError::field(field, "must be positive"));
            }
            check_range(field, price)?;
        }
        check_non_negative("acquisition_costs", cg.acquisition_costs)?;
        check_non_negative("disposal_costs", cg.disposal_costs)?;
        check_non_negative("improvement_costs", cg.improvement_costs)
    }

    fn calculate(&self, input: &TaxInput) -> Decimal {
        let TaxInput::CapitalGains(cg) = input else {
            return mismatched_input(TaxCategory::CapitalGains, input);
        };
        let gross = Self::gross_gain(cg);
        if gross <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let net = gross * (Decimal::ONE - self.abatement.fraction(cg.holding_years));
        net * self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisc_core::Amount;

    fn disposal(sale: Decimal, purchase: Decimal, years: u32) -> TaxInput {
        TaxInput::CapitalGains(CapitalGainsInput {
            sale_price: Amount::new(sale),
            purchase_price: Amount::new(purchase),
            acquisition_costs: Amount::new(dec!(15000)),
            disposal_costs: Amount::new(dec!(5000)),
            improvement_costs: Amount::new(dec!(10000)),
            holding_years: years,
        })
    }

    fn liability(input: &TaxInput) -> Decimal {
        let tax = CapitalGainsTax::default();
        tax.validate(input).unwrap();
        tax.calculate(input)
    }

    #[test]
    fn abatement_curve() {
        let a = AbatementSchedule::default();
        assert_eq!(a.fraction(0), Decimal::ZERO);
        assert_eq!(a.fraction(5), Decimal::ZERO);
        assert_eq!(a.fraction(6), dec!(0.06));
        assert_eq!(a.fraction(10), dec!(0.30));
        assert_eq!(a.fraction(21), dec!(0.96));
        assert_eq!(a.fraction(22), Decimal::ONE);
        assert_eq!(a.fraction(40), Decimal::ONE);
    }

    #[test]
    fn reference_values() {
        assert_eq!(liability(&disposal(dec!(300000), dec!(200000), 5)), dec!(13300));
        assert_eq!(liability(&disposal(dec!(300000), dec!(200000), 10)), dec!(9310));
        assert_eq!(liability(&disposal(dec!(300000), dec!(200000), 21)), dec!(532));
        assert_eq!(liability(&disposal(dec!(300000), dec!(200000), 22)), Decimal::ZERO);
    }

    #[test]
    fn loss_owes_nothing() {
        assert_eq!(liability(&disposal(dec!(200000), dec!(200000), 1)), Decimal::ZERO);
        assert_eq!(liability(&disposal(dec!(150000), dec!(200000), 1)), Decimal::ZERO);
    }

    #[test]
    fn rejects_non_positive_prices() {
        let tax = CapitalGainsTax::default();
        let err = tax.validate(&disposal(dec!(0), dec!(200000), 3)).unwrap_err();
        assert_eq!(err, ValidationError::field("sale_price", "must be positive"));
        let err = tax.validate(&disposal(dec!(300000), dec!(-1), 3)).unwrap_err();
        assert_eq!(err, ValidationError::field("purchase_price", "must be positive"));
    }

    #[test]
    fn rejects_negative_costs() {
        let mut input = disposal(dec!(300000), dec!(200000), 3);
        if let TaxInput::CapitalGains(cg) = &mut input {
            cg.disposal_costs = Amount::new(dec!(-10));
        }
        let err = CapitalGainsTax::default().validate(&input).unwrap_err();
        assert_eq!(err, ValidationError::field("disposal_costs", "must not be negative"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use fisc_core::Amount;
    use proptest::prelude::*;

    fn input(sale: i64, purchase: i64, costs: i64, years: u32) -> TaxInput {
        TaxInput::CapitalGains(CapitalGainsInput {
            sale_price: Amount::new(Decimal::from(sale)),
            purchase_price: Amount::new(Decimal::from(purchase)),
            acquisition_costs: Amount::new(Decimal::from(costs)),
            disposal_costs: Amount::ZERO,
            improvement_costs: Amount::ZERO,
            holding_years: years,
        })
    }

    proptest! {
        #[test]
        fn non_positive_gain_owes_nothing(
            purchase in 1i64..10_000_000,
            loss in 0i64..1_000_000,
            costs in 0i64..100_000,
            years in 0u32..60,
        ) {
            let sale = (purchase - loss).max(1);
            let tax = CapitalGainsTax::default();
            let input = input(sale, purchase, costs, years);
            prop_assert!(tax.validate(&input).is_ok());
            prop_assert_eq!(tax.calculate(&input), Decimal::ZERO);
        }

        #[test]
        fn fully_exempt_after_maximum_holding(
            purchase in 1i64..10_000_000,
            gain in 0i64..100_000_000,
            years in 22u32..100,
        ) {
            let tax = CapitalGainsTax::default();
            let input = input(purchase + gain, purchase, 0, years);
            prop_assert_eq!(tax.calculate(&input), Decimal::ZERO);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "given unvalidated wealth input")]
    fn mismatched_category_panics_in_debug_builds() {
        CapitalGainsTax::default().calculate(&TaxInput::Wealth(fisc_core::WealthInput { net_worth: Amount::new(dec!(100)) }));
    }
}
