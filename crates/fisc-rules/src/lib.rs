//! # fisc-rules — Tax Rule Registry and Bracket Calculations
//!
//! A [`Rule`] pairs a validation predicate with a pure calculation and
//! applicability metadata. The [`RuleRegistry`] holds one active rule per id
//! and keeps every superseded version in an append-only history.
//!
//! The calculations themselves live in [`wealth`], [`capital_gains`],
//! [`property`] and [`corporate`]; the first and last share the progressive
//! marginal-bracket engine in [`bracket`].
//!
//! ## Invariant
//!
//! A rule's calculation only ever runs on input its own `validate` accepted.
//! The registry and the engine reach calculations through [`Rule::evaluate`],
//! which validates first.

pub mod bracket;
pub mod capital_gains;
pub mod corporate;
pub mod error;
pub mod property;
pub mod registry;
pub mod rule;
pub mod standard;
pub mod wealth;

pub use bracket::{Bracket, BracketSchedule};
pub use capital_gains::{AbatementSchedule, CapitalGainsTax};
pub use corporate::CorporateIncomeTax;
pub use error::{RuleError, ScheduleError};
pub use property::{DefaultRates, RecurringPropertyTax};
pub use registry::RuleRegistry;
pub use rule::{Calculation, Rule, RuleMetadata, RuleSummary};
pub use standard::{
    standard_rules, CAPITAL_GAINS_RULE_ID, CORPORATE_INCOME_RULE_ID, RECURRING_PROPERTY_RULE_ID,
    WEALTH_TAX_RULE_ID,
};
pub use wealth::WealthTax;
