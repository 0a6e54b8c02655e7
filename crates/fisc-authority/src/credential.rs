//! Authentication material returned by [`TaxAuthority::authenticate`].
//!
//! Secrets are held in [`Zeroizing`] buffers and wiped on drop. `Debug`
//! never prints them.
//!
//! [`TaxAuthority::authenticate`]: crate::TaxAuthority::authenticate

use std::fmt;
use zeroize::Zeroizing;

/// A credential presented on every call to an authority.
#[derive(Clone)]
pub enum Credential {
    /// Access token sent as `Authorization: Bearer <token>`.
    Bearer(Zeroizing<String>),
    /// Static key sent in a named header.
    ApiKey(Zeroizing<String>),
    /// The authority needs no credential.
    Anonymous,
}

impl Credential {
    /// Bearer token credential.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(Zeroizing::new(token.into()))
    }

    /// API key credential.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(Zeroizing::new(key.into()))
    }

    /// The raw secret, if any.
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Bearer(s) | Self::ApiKey(s) => Some(s.as_str()),
            Self::Anonymous => None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Credential::Bearer([REDACTED])"),
            Self::ApiKey(_) => f.write_str("Credential::ApiKey([REDACTED])"),
            Self::Anonymous => f.write_str("Credential::Anonymous"),
        }
    }
}
