//! HTTP authority configuration.
//!
//! Two presets cover the systems in use: a tax administration that issues
//! short-lived bearer tokens through a client-credentials exchange, and an
//! accounting system that accepts a static API key header. Paths and
//! response field names are configurable for anything in between.

use std::fmt;
use url::Url;
use zeroize::Zeroizing;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How an authority authenticates callers.
#[derive(Clone)]
pub enum AuthScheme {
    /// `POST <auth_path>` with client id and secret, returning `access_token`.
    ClientCredentials {
        /// Path of the token endpoint.
        auth_path: String,
        /// OAuth-style client identifier.
        client_id: String,
        /// Client secret.
        client_secret: Zeroizing<String>,
    },
    /// Static key sent in `header` on every call.
    ApiKey {
        /// Header name, e.g. `X-API-Key`.
        header: String,
        /// The key.
        key: Zeroizing<String>,
    },
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCredentials {
                auth_path,
                client_id,
                ..
            } => f
                .debug_struct("ClientCredentials")
                .field("auth_path", auth_path)
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
            Self::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Configuration for one [`HttpTaxAuthority`](crate::HttpTaxAuthority).
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// Name recorded as the response `source`.
    pub name: String,
    /// Base URL; endpoint paths are appended to it.
    pub base_url: Url,
    /// Authentication scheme.
    pub auth: AuthScheme,
    /// Path of the calculation endpoint.
    pub calculate_path: String,
    /// Path of the validation endpoint.
    pub validate_path: String,
    /// Field of the calculation response holding the amount.
    pub amount_field: String,
    /// Field of the validation response holding the verdict.
    pub valid_field: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl AuthorityConfig {
    /// Tax administration preset: token from `/auth`, bearer calls to
    /// `/calculate` (field `amount`) and `/validate` (field `valid`).
    pub fn tax_administration(
        name: impl Into<String>,
        base_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url,
            auth: AuthScheme::ClientCredentials {
                auth_path: "/auth".into(),
                client_id: client_id.into(),
                client_secret: Zeroizing::new(client_secret.into()),
            },
            calculate_path: "/calculate".into(),
            validate_path: "/validate".into(),
            amount_field: "amount".into(),
            valid_field: "valid".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Accounting system preset: `X-API-Key` header, `/tax/calculate`
    /// (field `result`) and `/validate` (field `isValid`).
    pub fn accounting_system(
        name: impl Into<String>,
        base_url: Url,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url,
            auth: AuthScheme::ApiKey {
                header: "X-API-Key".into(),
                key: Zeroizing::new(api_key.into()),
            },
            calculate_path: "/tax/calculate".into(),
            validate_path: "/validate".into(),
            amount_field: "result".into(),
            valid_field: "isValid".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Absolute URL for `path`.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}
