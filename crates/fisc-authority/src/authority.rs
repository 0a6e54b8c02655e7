//! # Tax Authority Capability
//!
//! The [`TaxAuthority`] trait abstracts over an external system that can
//! compute and validate tax data. Production deployments use
//! [`HttpTaxAuthority`](crate::HttpTaxAuthority); tests script their own
//! implementations.
//!
//! ## Contract
//!
//! - `authenticate` produces a [`Credential`] the caller may cache and pass
//!   to later calls. Implementations do not cache internally.
//! - Any error from any method is a failure of this authority only. Callers
//!   must not treat one authority's failure as fatal for the request.
//! - Implementations are `Send + Sync` and shared behind `Arc`.

use async_trait::async_trait;
use fisc_core::{Amount, TaxCalculationRequest, TaxInput};

use crate::credential::Credential;
use crate::error::AuthorityError;

/// An external source of tax computations.
#[async_trait]
pub trait TaxAuthority: Send + Sync {
    /// Name recorded as the `source` of responses this authority produces.
    fn name(&self) -> &str;

    /// Obtain a credential.
    async fn authenticate(&self) -> Result<Credential, AuthorityError>;

    /// Compute the liability for `request`.
    async fn calculate_tax(
        &self,
        credential: &Credential,
        request: &TaxCalculationRequest,
    ) -> Result<Amount, AuthorityError>;

    /// Ask whether `input` is well-formed in the authority's view.
    async fn validate_data(
        &self,
        credential: &Credential,
        input: &TaxInput,
    ) -> Result<bool, AuthorityError>;
}
