//! # Calculation Input
//!
//! [`TaxInput`] is a tagged union with one concrete shape per
//! [`TaxCategory`]. It serializes adjacently tagged:
//!
//! ```json
//! {"type": "wealth", "data": {"net_worth": "1500000"}}
//! ```
//!
//! Required fields are non-optional, so "missing field" is rejected at
//! deserialization. Value-domain constraints (non-negative amounts, positive
//! prices) are enforced by each rule's `validate`.

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, Rate};
use crate::category::TaxCategory;

/// Corporate income input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateIncomeInput {
    /// Taxable profit for the fiscal year.
    pub taxable_profit: Amount,
}

/// VAT input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatInput {
    /// Net amount before tax.
    pub net_amount: Amount,
}

/// Real-estate holding company input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SciInput {
    /// Taxable income of the company.
    pub taxable_income: Amount,
}

/// Local business tax input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBusinessInput {
    /// Rental-value base of the premises used by the business.
    pub rental_value_base: Amount,
}

/// Wealth tax input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WealthInput {
    /// Net taxable real-property wealth.
    pub net_worth: Amount,
}

/// Capital-gains input for a property disposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsInput {
    /// Disposal price.
    pub sale_price: Amount,
    /// Acquisition price.
    pub purchase_price: Amount,
    /// Costs incurred on acquisition (notary, registration).
    #[serde(default)]
    pub acquisition_costs: Amount,
    /// Costs incurred on disposal (agency fees, diagnostics).
    #[serde(default)]
    pub disposal_costs: Amount,
    /// Capital improvement works.
    #[serde(default)]
    pub improvement_costs: Amount,
    /// Whole years the property was held.
    pub holding_years: u32,
}

/// Jurisdiction-level rate components, each in percent.
///
/// A missing component falls back to the rule's documented default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionRates {
    /// Municipal rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipal: Option<Rate>,
    /// Departmental rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departmental: Option<Rate>,
    /// Regional rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional: Option<Rate>,
}

/// Recurring property tax input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPropertyInput {
    /// Assessed (cadastral) rental value.
    pub assessed_rental_value: Amount,
    /// Rates supplied by the jurisdiction.
    #[serde(default)]
    pub rates: JurisdictionRates,
}

/// Structured calculation input, one variant per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TaxInput {
    /// See [`CorporateIncomeInput`].
    CorporateIncome(CorporateIncomeInput),
    /// See [`VatInput`].
    Vat(VatInput),
    /// See [`SciInput`].
    Sci(SciInput),
    /// See [`LocalBusinessInput`].
    LocalBusiness(LocalBusinessInput),
    /// See [`WealthInput`].
    Wealth(WealthInput),
    /// See [`CapitalGainsInput`].
    CapitalGains(CapitalGainsInput),
    /// See [`RecurringPropertyInput`].
    RecurringProperty(RecurringPropertyInput),
}

impl TaxInput {
    /// The category this input belongs to.
    pub fn category(&self) -> TaxCategory {
        match self {
            Self::CorporateIncome(_) => TaxCategory::CorporateIncome,
            Self::Vat(_) => TaxCategory::Vat,
            Self::Sci(_) => TaxCategory::Sci,
            Self::LocalBusiness(_) => TaxCategory::LocalBusiness,
            Self::Wealth(_) => TaxCategory::Wealth,
            Self::CapitalGains(_) => TaxCategory::CapitalGains,
            Self::RecurringProperty(_) => TaxCategory::RecurringProperty,
        }
    }

    /// Parse an input from a category and its `data` payload.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when `data` does not match the
    /// shape required by `category`.
    pub fn from_parts(
        category: TaxCategory,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": category.as_str(),
            "data": data,
        }))
    }

    /// The `data` payload without the category tag.
    pub fn data(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("data").unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn wealth_serializes_adjacently_tagged() {
        let input = TaxInput::Wealth(WealthInput {
            net_worth: Amount::new(dec!(1500000)),
        });
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "wealth", "data": {"net_worth": "1500000"}})
        );
    }

    #[test]
    fn from_parts_parses_capital_gains_with_defaults() {
        let input = TaxInput::from_parts(
            TaxCategory::CapitalGains,
            serde_json::json!({"sale_price": 300000, "purchase_price": "200000", "holding_years": 8}),
        )
        .unwrap();
        match input {
            TaxInput::CapitalGains(cg) => {
                assert_eq!(cg.sale_price.value(), dec!(300000));
                assert_eq!(cg.acquisition_costs, Amount::ZERO);
                assert_eq!(cg.holding_years, 8);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn from_parts_rejects_missing_required_field() {
        let err = TaxInput::from_parts(TaxCategory::Wealth, serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("net_worth"));
    }

    #[test]
    fn from_parts_rejects_shape_of_other_category() {
        assert!(TaxInput::from_parts(
            TaxCategory::Vat,
            serde_json::json!({"net_worth": "10"})
        )
        .is_err());
    }

    #[test]
    fn property_rates_are_optional() {
        let input = TaxInput::from_parts(
            TaxCategory::RecurringProperty,
            serde_json::json!({"assessed_rental_value": "4000", "rates": {"municipal": 20.5}}),
        )
        .unwrap();
        match input {
            TaxInput::RecurringProperty(p) => {
                assert_eq!(p.rates.municipal, Some(Rate::percent(dec!(20.5))));
                assert_eq!(p.rates.departmental, None);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn category_and_data() {
        let input = TaxInput::Vat(VatInput {
            net_amount: Amount::new(dec!(100)),
        });
        assert_eq!(input.category(), TaxCategory::Vat);
        assert_eq!(input.data(), serde_json::json!({"net_amount": "100"}));
    }
}
