//! # Tax Categories
//!
//! The closed set of tax kinds the engine knows about. Every rule declares
//! exactly one category and every [`crate::TaxInput`] variant maps to exactly
//! one category.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of variants in [`TaxCategory`].
pub const TAX_CATEGORY_COUNT: usize = 7;

/// A kind of tax liability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxCategory {
    /// Corporate income tax on taxable profit.
    CorporateIncome,
    /// Value-added tax on a net (pre-tax) amount.
    Vat,
    /// Taxation specific to real-estate holding companies.
    Sci,
    /// Local business tax assessed on a rental-value base.
    LocalBusiness,
    /// Wealth tax on net real-property holdings.
    Wealth,
    /// Capital-gains tax on a property disposal.
    CapitalGains,
    /// Recurring annual property tax.
    RecurringProperty,
}

impl TaxCategory {
    /// All categories in declaration order.
    pub const ALL: [TaxCategory; TAX_CATEGORY_COUNT] = [
        Self::CorporateIncome,
        Self::Vat,
        Self::Sci,
        Self::LocalBusiness,
        Self::Wealth,
        Self::CapitalGains,
        Self::RecurringProperty,
    ];

    /// The serialized identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CorporateIncome => "corporate_income",
            Self::Vat => "vat",
            Self::Sci => "sci",
            Self::LocalBusiness => "local_business",
            Self::Wealth => "wealth",
            Self::CapitalGains => "capital_gains",
            Self::RecurringProperty => "recurring_property",
        }
    }
}

impl fmt::Display for TaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown tax category: {s:?}"))
    }
}
