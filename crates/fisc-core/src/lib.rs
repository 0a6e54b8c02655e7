//! # fisc-core — Foundational Types for the fisc Tax Engine
//!
//! Every other crate in the workspace depends on `fisc-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Decimal money, never floats.** Monetary values are [`Amount`] and rate
//!    components are [`Rate`], both newtypes over `rust_decimal::Decimal`.
//!    Binary floating point never enters a calculation chain.
//!
//! 2. **Closed category set.** [`TaxCategory`] is a single enum matched
//!    exhaustively. Adding a category forces every consumer to handle it.
//!
//! 3. **Typed input.** [`TaxInput`] is a tagged union with one concrete shape
//!    per category, so rules pattern-match instead of probing loose JSON.
//!
//! 4. **Fingerprints flow through `CanonicalBytes`.** Cache keys are SHA-256
//!    over RFC 8785 canonical bytes, so object key order never changes a
//!    fingerprint.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fisc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod category;
pub mod digest;
pub mod error;
pub mod input;
pub mod request;
pub mod temporal;

pub use amount::{Amount, Rate, MAX_SUPPORTED_MAGNITUDE};
pub use canonical::CanonicalBytes;
pub use category::{TaxCategory, TAX_CATEGORY_COUNT};
pub use digest::{fingerprint, sha256_hex, Fingerprint};
pub use error::{CanonicalizationError, FiscError, ValidationError};
pub use input::{
    CapitalGainsInput, CorporateIncomeInput, JurisdictionRates, LocalBusinessInput,
    RecurringPropertyInput, SciInput, TaxInput, VatInput, WealthInput,
};
pub use request::{TaxCalculationRequest, TaxCalculationResponse, LOCAL_FALLBACK_SOURCE};
pub use temporal::Timestamp;
