//! Default rule set registered at engine startup.
//!
//! Parameters are jurisdictional data, not code: callers that track a
//! different year or jurisdiction register their own [`Rule`]s under the
//! same ids and the registry archives these.

use chrono::NaiveDate;

use crate::capital_gains::CapitalGainsTax;
use crate::corporate::CorporateIncomeTax;
use crate::property::RecurringPropertyTax;
use crate::rule::{Rule, RuleMetadata};
use crate::wealth::WealthTax;

/// Id of the default wealth tax rule.
pub const WEALTH_TAX_RULE_ID: &str = "wealth_tax";
/// Id of the default property capital gains rule.
pub const CAPITAL_GAINS_RULE_ID: &str = "capital_gains_property";
/// Id of the default recurring property tax rule.
pub const RECURRING_PROPERTY_RULE_ID: &str = "recurring_property_tax";
/// Id of the default corporate income tax rule.
pub const CORPORATE_INCOME_RULE_ID: &str = "corporate_income_tax";

/// The default rules, in registration order.
pub fn standard_rules() -> Vec<Rule> {
    vec![
        Rule::new(WEALTH_TAX_RULE_ID, "Real-property wealth tax", WealthTax::default())
            .with_metadata(RuleMetadata {
                description: Some("Progressive tax on net real-property wealth above 800 000".into()),
                effective_from: NaiveDate::from_ymd_opt(2024, 1, 1),
                effective_until: None,
                region: Some("FR".into()),
            }),
        Rule::new(
            CAPITAL_GAINS_RULE_ID,
            "Capital gains on property disposal",
            CapitalGainsTax::default(),
        )
        .with_metadata(RuleMetadata {
            description: Some("19 % flat rate after holding-period abatement".into()),
            region: Some("FR".into()),
            ..RuleMetadata::default()
        }),
        Rule::new(
            RECURRING_PROPERTY_RULE_ID,
            "Recurring property tax",
            RecurringPropertyTax::default(),
        )
        .with_metadata(RuleMetadata {
            description: Some("Assessed rental value times summed local rates".into()),
            region: Some("FR".into()),
            ..RuleMetadata::default()
        }),
        Rule::new(
            CORPORATE_INCOME_RULE_ID,
            "Corporate income tax",
            CorporateIncomeTax::default(),
        )
        .with_metadata(RuleMetadata {
            description: Some("15 % up to 42 500, 25 % above".into()),
            region: Some("FR".into()),
            ..RuleMetadata::default()
        }),
    ]
}
