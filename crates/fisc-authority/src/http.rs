//! # HTTP Tax Authority
//!
//! [`HttpTaxAuthority`] implements [`TaxAuthority`] over JSON/HTTP. Every call
//! is a `POST`:
//!
//! | Operation      | Body                                   | Response field            |
//! |----------------|----------------------------------------|---------------------------|
//! | authenticate   | `{client_id, client_secret, grant_type}` | `access_token`          |
//! | calculate_tax  | `{type, data, year}`                   | `amount_field` (config)   |
//! | validate_data  | `{type, data}`                         | `valid_field` (config)    |
//!
//! API-key authorities skip the token exchange: `authenticate` returns the
//! configured key without a network call.
//!
//! ## Error mapping
//!
//! - transport timeout → [`AuthorityError::Timeout`]
//! - other transport failure, 5xx → [`AuthorityError::ServiceUnavailable`]
//! - 401/403 → [`AuthorityError::Unauthorized`]
//! - other 4xx → [`AuthorityError::Rejected`]
//! - missing or mistyped response field → [`AuthorityError::Deserialization`]
//!
//! Transport failures are retried with backoff; HTTP responses are not.
//! `calculate_tax` is only resent when the connection itself failed, so an
//! authority that timed out while processing never sees the request twice.

use std::time::Duration;

use async_trait::async_trait;
use fisc_core::{Amount, TaxCalculationRequest, TaxInput};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::authority::TaxAuthority;
use crate::config::{AuthScheme, AuthorityConfig};
use crate::credential::Credential;
use crate::error::{excerpt, AuthorityError};
use crate::retry::{retry_send, RetryPolicy};

/// A tax authority reached over HTTP.
#[derive(Debug)]
pub struct HttpTaxAuthority {
    client: reqwest::Client,
    config: AuthorityConfig,
}

impl HttpTaxAuthority {
    /// Build the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// [`AuthorityError::NotConfigured`] if the client cannot be built or the
    /// API-key header name is not a valid header.
    pub fn new(config: AuthorityConfig) -> Result<Self, AuthorityError> {
        if let AuthScheme::ApiKey { header, .. } = &config.auth {
            HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
                AuthorityError::NotConfigured {
                    reason: format!("{}: invalid header name {header:?}", config.name),
                }
            })?;
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                headers
            })
            .build()
            .map_err(|e| AuthorityError::NotConfigured {
                reason: format!("{}: failed to build HTTP client: {e}", config.name),
            })?;

        Ok(Self { client, config })
    }

    /// The configuration this authority was built from.
    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Header carrying the credential, if any.
    fn auth_header(
        &self,
        credential: &Credential,
    ) -> Result<Option<(HeaderName, HeaderValue)>, AuthorityError> {
        let invalid = |what: &str| AuthorityError::Authentication {
            authority: self.config.name.clone(),
            reason: format!("{what} contains invalid header characters"),
        };
        match credential {
            Credential::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                    .map_err(|_| invalid("access token"))?;
                value.set_sensitive(true);
                Ok(Some((AUTHORIZATION, value)))
            }
            Credential::ApiKey(key) => {
                let name = match &self.config.auth {
                    AuthScheme::ApiKey { header, .. } => HeaderName::from_bytes(header.as_bytes())
                        .map_err(|_| invalid("API key header name"))?,
                    AuthScheme::ClientCredentials { .. } => HeaderName::from_static("x-api-key"),
                };
                let mut value =
                    HeaderValue::from_str(key.as_str()).map_err(|_| invalid("API key"))?;
                value.set_sensitive(true);
                Ok(Some((name, value)))
            }
            Credential::Anonymous => Ok(None),
        }
    }

    /// POST `body` to `path` and return the JSON response, mapping HTTP
    /// failures consistently.
    async fn post_json(
        &self,
        operation: &str,
        path: &str,
        body: &Value,
        credential: &Credential,
        policy: RetryPolicy,
    ) -> Result<Value, AuthorityError> {
        let url = self.config.endpoint(path);
        let name = self.config.name.as_str();
        tracing::debug!(authority = name, operation, %url, "sending authority request");

        let auth = self.auth_header(credential)?;
        let resp = retry_send(name, policy, || {
            let mut request = self.client.post(&url).json(body);
            if let Some((header, value)) = &auth {
                request = request.header(header.clone(), value.clone());
            }
            request.send()
        })
        .await
        .map_err(|e| {
            if e.is_timeout() {
                AuthorityError::Timeout {
                    authority: name.to_string(),
                    elapsed_ms: self.config.timeout_secs.saturating_mul(1000),
                }
            } else {
                AuthorityError::ServiceUnavailable {
                    authority: name.to_string(),
                    reason: format!("{operation}: {e}"),
                }
            }
        })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthorityError::Unauthorized {
                authority: name.to_string(),
                status: status.as_u16(),
            });
        }
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthorityError::ServiceUnavailable {
                authority: name.to_string(),
                reason: format!("{operation}: HTTP {status}: {}", excerpt(&body)),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthorityError::Rejected {
                authority: name.to_string(),
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| self.malformed(format!("{operation}: response is not JSON: {e}")))
    }

    fn malformed(&self, reason: String) -> AuthorityError {
        AuthorityError::Deserialization {
            authority: self.config.name.clone(),
            reason,
        }
    }

    fn field<'a>(&self, body: &'a Value, field: &str) -> Result<&'a Value, AuthorityError> {
        body.get(field)
            .ok_or_else(|| self.malformed(format!("missing field `{field}`")))
    }

    fn encode<T: serde::Serialize>(&self, value: &T) -> Result<Value, AuthorityError> {
        serde_json::to_value(value)
            .map_err(|e| self.malformed(format!("failed to encode request: {e}")))
    }
}

#[async_trait]
impl TaxAuthority for HttpTaxAuthority {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn authenticate(&self) -> Result<Credential, AuthorityError> {
        let (auth_path, client_id, client_secret) = match &self.config.auth {
            AuthScheme::ApiKey { key, .. } => return Ok(Credential::ApiKey(key.clone())),
            AuthScheme::ClientCredentials {
                auth_path,
                client_id,
                client_secret,
            } => (auth_path, client_id, client_secret),
        };

        let body = serde_json::json!({
            "client_id": client_id,
            "client_secret": client_secret.as_str(),
            "grant_type": "client_credentials",
        });
        let resp = self
            .post_json(
                "authenticate",
                auth_path,
                &body,
                &Credential::Anonymous,
                RetryPolicy::AnyTransport,
            )
            .await
            .map_err(|e| match e {
                AuthorityError::Unauthorized { .. } | AuthorityError::Rejected { .. } => {
                    AuthorityError::Authentication {
                        authority: self.config.name.clone(),
                        reason: e.to_string(),
                    }
                }
                other => other,
            })?;

        match resp.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(Credential::bearer(token)),
            _ => Err(AuthorityError::Authentication {
                authority: self.config.name.clone(),
                reason: "token response missing `access_token`".into(),
            }),
        }
    }

    async fn calculate_tax(
        &self,
        credential: &Credential,
        request: &TaxCalculationRequest,
    ) -> Result<Amount, AuthorityError> {
        let body = self.encode(request)?;
        let resp = self
            .post_json(
                "calculate_tax",
                &self.config.calculate_path,
                &body,
                credential,
                RetryPolicy::ConnectOnly,
            )
            .await?;

        let raw = self.field(&resp, &self.config.amount_field)?;
        let amount: Amount = serde_json::from_value(raw.clone()).map_err(|e| {
            self.malformed(format!("`{}` is not a decimal: {e}", self.config.amount_field))
        })?;
        if amount.is_negative() {
            return Err(self.malformed(format!(
                "`{}` is negative: {amount}",
                self.config.amount_field
            )));
        }
        Ok(amount)
    }

    async fn validate_data(
        &self,
        credential: &Credential,
        input: &TaxInput,
    ) -> Result<bool, AuthorityError> {
        let body = self.encode(input)?;
        let resp = self
            .post_json(
                "validate_data",
                &self.config.validate_path,
                &body,
                credential,
                RetryPolicy::AnyTransport,
            )
            .await?;

        self.field(&resp, &self.config.valid_field)?
            .as_bool()
            .ok_or_else(|| {
                self.malformed(format!("`{}` is not a boolean", self.config.valid_field))
            })
    }
}
