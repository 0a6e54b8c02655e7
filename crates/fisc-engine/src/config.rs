//! # Engine Configuration
//!
//! Loaded from YAML; every field has a default, so an empty document is a
//! valid configuration (no authorities, local computation only).
//!
//! ```yaml
//! cache:
//!   default_ttl_secs: 3600
//! orchestrator:
//!   fallback_enabled: true
//!   adapter_timeout_ms: 30000
//!   overall_deadline_ms: 90000
//! authorities:
//!   - name: dgfip
//!     base_url: https://api.impots.example
//!     auth:
//!       scheme: client_credentials
//!       client_id_env: DGFIP_CLIENT_ID
//!       client_secret_env: DGFIP_CLIENT_SECRET
//!   - name: books
//!     base_url: https://books.example/api
//!     auth:
//!       scheme: api_key
//!       api_key_env: BOOKS_API_KEY
//! ```
//!
//! Secrets never appear in the file, only the names of the environment
//! variables holding them.
//!
//! ## Environment overrides
//!
//! | Variable                   | Field                              |
//! |----------------------------|------------------------------------|
//! | `FISC_CACHE_TTL_SECS`      | `cache.default_ttl_secs`           |
//! | `FISC_FALLBACK_ENABLED`    | `orchestrator.fallback_enabled`    |
//! | `FISC_ADAPTER_TIMEOUT_MS`  | `orchestrator.adapter_timeout_ms`  |
//! | `FISC_OVERALL_DEADLINE_MS` | `orchestrator.overall_deadline_ms` |

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use fisc_authority::{AuthScheme, AuthorityConfig, AuthorityError, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use crate::cache::MAX_TTL;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The YAML is malformed or has unknown fields.
    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// A field holds an unusable value.
    #[error("invalid config field `{field}`: {reason}")]
    InvalidField {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment variable named by the config is not set.
    #[error("authority {authority}: environment variable {var} is not set")]
    MissingSecret {
        /// Authority name.
        authority: String,
        /// Variable name.
        var: String,
    },

    /// An authority could not be built.
    #[error("authority {name}: {source}")]
    Authority {
        /// Authority name.
        name: String,
        /// Underlying error.
        source: AuthorityError,
    },
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Result cache settings.
    pub cache: CacheConfig,
    /// Orchestrator settings.
    pub orchestrator: OrchestratorConfig,
    /// Authorities, in fallback priority order.
    pub authorities: Vec<AuthorityEntry>,
}

/// Result cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// TTL of cached responses, in seconds. At most one year.
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 3600,
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Compute locally when every authority fails.
    pub fallback_enabled: bool,
    /// Upper bound on a single authority call, in milliseconds.
    pub adapter_timeout_ms: u64,
    /// Upper bound on all authority calls of one request, in milliseconds.
    pub overall_deadline_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            adapter_timeout_ms: 30_000,
            overall_deadline_ms: 90_000,
        }
    }
}

impl OrchestratorConfig {
    /// Per-authority timeout.
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }

    /// Per-request deadline.
    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }
}

/// How an authority authenticates, by reference to environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthEntry {
    /// Client-credentials token exchange.
    ClientCredentials {
        /// Variable holding the client id.
        client_id_env: String,
        /// Variable holding the client secret.
        client_secret_env: String,
    },
    /// Static API key header.
    ApiKey {
        /// Variable holding the key.
        api_key_env: String,
        /// Header name; `X-API-Key` when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<String>,
    },
}

/// One configured authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorityEntry {
    /// Name recorded as the response source.
    pub name: String,
    /// Base URL.
    pub base_url: String,
    /// Authentication scheme.
    pub auth: AuthEntry,
    /// Token endpoint path (client credentials only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_path: Option<String>,
    /// Calculation endpoint path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculate_path: Option<String>,
    /// Validation endpoint path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_path: Option<String>,
    /// Response field holding the amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_field: Option<String>,
    /// Response field holding the validation verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_field: Option<String>,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl EngineConfig {
    /// Parse YAML without applying environment overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::InvalidField`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, apply process environment overrides, and validate.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] other than `MissingSecret`/`Authority`, which are
    /// only raised when authorities are built.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&yaml)?;
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply `FISC_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] on unparseable values.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = parse_env(&lookup, "FISC_CACHE_TTL_SECS")? {
            self.cache.default_ttl_secs = v;
        }
        if let Some(v) = parse_env(&lookup, "FISC_FALLBACK_ENABLED")? {
            self.orchestrator.fallback_enabled = v;
        }
        if let Some(v) = parse_env(&lookup, "FISC_ADAPTER_TIMEOUT_MS")? {
            self.orchestrator.adapter_timeout_ms = v;
        }
        if let Some(v) = parse_env(&lookup, "FISC_OVERALL_DEADLINE_MS")? {
            self.orchestrator.overall_deadline_ms = v;
        }
        self.validate()
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidField`] for the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: String, reason: &str| ConfigError::InvalidField {
            field,
            reason: reason.to_string(),
        };
        if self.cache.default_ttl_secs > MAX_TTL.as_secs() {
            return Err(ConfigError::InvalidField {
                field: "cache.default_ttl_secs".into(),
                reason: format!("must not exceed {} seconds", MAX_TTL.as_secs()),
            });
        }
        if self.orchestrator.adapter_timeout_ms == 0 {
            return Err(invalid("orchestrator.adapter_timeout_ms".into(), "must be positive"));
        }
        if self.orchestrator.overall_deadline_ms == 0 {
            return Err(invalid("orchestrator.overall_deadline_ms".into(), "must be positive"));
        }
        let mut names = HashSet::new();
        for (i, entry) in self.authorities.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(invalid(format!("authorities[{i}].name"), "must not be empty"));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(invalid(format!("authorities[{i}].name"), "duplicate authority name"));
            }
            if let Err(e) = Url::parse(&entry.base_url) {
                return Err(ConfigError::InvalidField {
                    field: format!("authorities[{i}].base_url"),
                    reason: e.to_string(),
                });
            }
            if entry.timeout_secs == 0 {
                return Err(invalid(format!("authorities[{i}].timeout_secs"), "must be positive"));
            }
        }
        Ok(())
    }

    /// Cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.default_ttl_secs)
    }
}

impl AuthorityEntry {
    /// Resolve secrets through `lookup` and build the authority configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingSecret`] if a named variable is unset,
    /// [`ConfigError::InvalidField`] if the base URL does not parse.
    pub fn resolve(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<AuthorityConfig, ConfigError> {
        let base_url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidField {
            field: format!("authorities.{}.base_url", self.name),
            reason: e.to_string(),
        })?;
        let secret = |var: &str| {
            lookup(var)
                .map(Zeroizing::new)
                .ok_or_else(|| ConfigError::MissingSecret {
                    authority: self.name.clone(),
                    var: var.to_string(),
                })
        };

        let mut config = match &self.auth {
            AuthEntry::ClientCredentials {
                client_id_env,
                client_secret_env,
            } => {
                let client_id = secret(client_id_env)?;
                let client_secret = secret(client_secret_env)?;
                let mut config = AuthorityConfig::tax_administration(
                    &self.name,
                    base_url,
                    client_id.as_str(),
                    client_secret.as_str(),
                );
                if let (Some(path), AuthScheme::ClientCredentials { auth_path, .. }) =
                    (&self.auth_path, &mut config.auth)
                {
                    auth_path.clone_from(path);
                }
                config
            }
            AuthEntry::ApiKey {
                api_key_env,
                header,
            } => {
                let key = secret(api_key_env)?;
                let mut config =
                    AuthorityConfig::accounting_system(&self.name, base_url, key.as_str());
                if let (Some(name), AuthScheme::ApiKey { header: h, .. }) =
                    (header, &mut config.auth)
                {
                    h.clone_from(name);
                }
                config
            }
        };

        if let Some(p) = &self.calculate_path {
            config.calculate_path.clone_from(p);
        }
        if let Some(p) = &self.validate_path {
            config.validate_path.clone_from(p);
        }
        if let Some(f) = &self.amount_field {
            config.amount_field.clone_from(f);
        }
        if let Some(f) = &self.valid_field {
            config.valid_field.clone_from(f);
        }
        Ok(config.with_timeout_secs(self.timeout_secs))
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}
