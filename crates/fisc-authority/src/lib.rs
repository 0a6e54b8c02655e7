//! # fisc-authority — External Tax Authorities
//!
//! The [`TaxAuthority`] capability (authenticate, calculate, validate) and its
//! HTTP implementation, [`HttpTaxAuthority`].
//!
//! ## Crate Policy
//!
//! This crate knows how to talk to an authority. It does not decide which
//! authority to ask, whether to fall back, or how long to wait overall; that
//! belongs to the engine's orchestrator.
//!
//! ## Secrets
//!
//! Client secrets, API keys and access tokens live in `zeroize::Zeroizing`
//! buffers and are redacted from every `Debug` rendering.

pub mod authority;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
mod retry;

pub use authority::TaxAuthority;
pub use config::{AuthScheme, AuthorityConfig, DEFAULT_TIMEOUT_SECS};
pub use credential::Credential;
pub use error::AuthorityError;
pub use http::HttpTaxAuthority;
