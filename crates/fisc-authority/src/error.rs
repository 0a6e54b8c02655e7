//! Tax authority error types.

/// Errors from an external tax authority.
///
/// The orchestrator treats every variant as a recoverable adapter failure;
/// the distinction exists for logging and for credential invalidation.
/// `Display` omits the authority name; callers prefix it where needed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    /// The authentication exchange failed.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Authority name.
        authority: String,
        /// Description of the failure.
        reason: String,
    },

    /// The authority refused the credential (HTTP 401 or 403).
    #[error("credential refused (HTTP {status})")]
    Unauthorized {
        /// Authority name.
        authority: String,
        /// HTTP status returned.
        status: u16,
    },

    /// Transport failure or 5xx response.
    #[error("service unavailable: {reason}")]
    ServiceUnavailable {
        /// Authority name.
        authority: String,
        /// Description of the outage.
        reason: String,
    },

    /// The authority rejected the request (4xx other than 401/403).
    #[error("request rejected (HTTP {status}): {body}")]
    Rejected {
        /// Authority name.
        authority: String,
        /// HTTP status returned.
        status: u16,
        /// Response body excerpt.
        body: String,
    },

    /// No answer within the allotted time.
    #[error("timed out after {elapsed_ms}ms")]
    Timeout {
        /// Authority name.
        authority: String,
        /// Time waited before giving up.
        elapsed_ms: u64,
    },

    /// The response did not have the expected shape.
    #[error("malformed response: {reason}")]
    Deserialization {
        /// Authority name.
        authority: String,
        /// What was wrong with the response.
        reason: String,
    },

    /// The authority cannot be built from the supplied configuration.
    #[error("authority not configured: {reason}")]
    NotConfigured {
        /// Why configuration is missing or invalid.
        reason: String,
    },
}

impl AuthorityError {
    /// True if a cached credential should be discarded.
    pub fn invalidates_credential(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Authentication { .. })
    }
}

/// Response bodies are truncated to this many characters in errors.
pub(crate) const BODY_EXCERPT_CHARS: usize = 256;

pub(crate) fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        body.to_string()
    } else {
        let mut s: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        s.push('…');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_authority_field() {
        let err = AuthorityError::Timeout {
            authority: "dgfip".into(),
            elapsed_ms: 30_000,
        };
        assert_eq!(err.to_string(), "timed out after 30000ms");
    }

    #[test]
    fn unauthorized_invalidates_credential() {
        assert!(AuthorityError::Unauthorized {
            authority: "a".into(),
            status: 401
        }
        .invalidates_credential());
        assert!(!AuthorityError::ServiceUnavailable {
            authority: "a".into(),
            reason: "down".into()
        }
        .invalidates_credential());
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(1000);
        let e = excerpt(&long);
        assert_eq!(e.chars().count(), BODY_EXCERPT_CHARS + 1);
        assert_eq!(excerpt("short"), "short");
    }
}
