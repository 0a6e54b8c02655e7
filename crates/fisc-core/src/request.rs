//! # Request and Response Envelopes
//!
//! A [`TaxCalculationRequest`] serializes as
//! `{"type": <category>, "data": {...}, "year": N}`, the same body external
//! authorities receive and the same value the cache fingerprints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::category::TaxCategory;
use crate::digest::{fingerprint, Fingerprint};
use crate::error::CanonicalizationError;
use crate::input::TaxInput;
use crate::temporal::Timestamp;

/// Source identifier recorded when the amount was computed locally.
pub const LOCAL_FALLBACK_SOURCE: &str = "local_fallback";

/// A request for a tax liability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationRequest {
    /// Category tag and typed payload.
    #[serde(flatten)]
    pub input: TaxInput,
    /// Fiscal year being assessed.
    pub year: i32,
}

impl TaxCalculationRequest {
    /// Build a request.
    pub fn new(input: TaxInput, year: i32) -> Self {
        Self { input, year }
    }

    /// The category of the payload.
    pub fn category(&self) -> TaxCategory {
        self.input.category()
    }

    /// Date at which rules are resolved for this fiscal year: 1 January.
    ///
    /// Returns `None` for years chrono cannot represent.
    pub fn as_of(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, 1, 1)
    }

    /// Deterministic cache key over `{type, year, data}`.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails; the decimal newtypes never emit floats.
    pub fn fingerprint(&self) -> Result<Fingerprint, CanonicalizationError> {
        fingerprint(self)
    }
}

/// A computed liability and its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationResponse {
    /// Computed liability.
    pub amount: Amount,
    /// Echo of the input for traceability.
    pub details: TaxInput,
    /// Name of the authority that produced the amount, or [`LOCAL_FALLBACK_SOURCE`].
    pub source: String,
    /// When the computation completed.
    pub timestamp: Timestamp,
}

impl TaxCalculationResponse {
    /// True if the amount came from the local fallback path.
    pub fn is_local(&self) -> bool {
        self.source == LOCAL_FALLBACK_SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{JurisdictionRates, RecurringPropertyInput, WealthInput};
    use rust_decimal_macros::dec;

    fn wealth(net_worth: rust_decimal::Decimal, year: i32) -> TaxCalculationRequest {
        TaxCalculationRequest::new(
            TaxInput::Wealth(WealthInput {
                net_worth: Amount::new(net_worth),
            }),
            year,
        )
    }

    #[test]
    fn serializes_flat_envelope() {
        let json = serde_json::to_value(wealth(dec!(1500000), 2024)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "wealth", "data": {"net_worth": "1500000"}, "year": 2024})
        );
    }

    #[test]
    fn deserializes_flat_envelope() {
        let req: TaxCalculationRequest = serde_json::from_str(
            r#"{"year": 2024, "type": "wealth", "data": {"net_worth": "1500000"}}"#,
        )
        .unwrap();
        assert_eq!(req, wealth(dec!(1500000), 2024));
    }

    #[test]
    fn fingerprint_ignores_trailing_zeros() {
        let a = wealth(dec!(1500000), 2024).fingerprint().unwrap();
        let b = wealth(dec!(1500000.00), 2024).fingerprint().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_depends_on_year_and_data() {
        let base = wealth(dec!(1500000), 2024).fingerprint().unwrap();
        assert_ne!(base, wealth(dec!(1500000), 2025).fingerprint().unwrap());
        assert_ne!(base, wealth(dec!(1500001), 2024).fingerprint().unwrap());
    }

    #[test]
    fn fingerprint_stable_across_optional_rate_order() {
        let a = TaxCalculationRequest::new(
            TaxInput::RecurringProperty(RecurringPropertyInput {
                assessed_rental_value: Amount::new(dec!(4000)),
                rates: JurisdictionRates::default(),
            }),
            2024,
        );
        let parsed: TaxCalculationRequest = serde_json::from_str(
            r#"{"data": {"rates": {}, "assessed_rental_value": 4000}, "type": "recurring_property", "year": 2024}"#,
        )
        .unwrap();
        assert_eq!(a.fingerprint().unwrap(), parsed.fingerprint().unwrap());
    }

    #[test]
    fn as_of_is_first_of_january() {
        let req = wealth(dec!(1), 2024);
        assert_eq!(req.as_of(), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn response_local_marker() {
        let resp = TaxCalculationResponse {
            amount: Amount::ZERO,
            details: wealth(dec!(1), 2024).input,
            source: LOCAL_FALLBACK_SOURCE.to_string(),
            timestamp: Timestamp::now(),
        };
        assert!(resp.is_local());
    }
}
