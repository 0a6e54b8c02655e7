//! Engine error types.
//!
//! Partial failures (one authority down, one validation source erroring) are
//! absorbed by the orchestrator and never surface here. Only exhaustion of
//! every computation path, invalid input, or bad configuration does.

use fisc_core::{CanonicalizationError, TaxCategory, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// One authority's failure during a calculation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterFailure {
    /// Authority name.
    pub adapter: String,
    /// Why it failed.
    pub reason: String,
}

/// Errors surfaced to engine callers.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The input was rejected before any authority was contacted.
    #[error("invalid calculation input: {0}")]
    Validation(#[from] ValidationError),

    /// Every authority failed and local fallback is disabled.
    #[error("all tax sources failed: {}", render(.failures))]
    AllSourcesFailed {
        /// One entry per attempted authority, in attempt order.
        failures: Vec<AdapterFailure>,
    },

    /// Every authority failed and no local rule or formula covers the category.
    #[error("no local computation for {category}; {}", render(.failures))]
    NoLocalComputation {
        /// Category of the request.
        category: TaxCategory,
        /// One entry per attempted authority, in attempt order.
        failures: Vec<AdapterFailure>,
    },

    /// The request could not be fingerprinted.
    #[error("failed to fingerprint request: {0}")]
    Fingerprint(#[from] CanonicalizationError),

    /// Invalid engine configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Per-authority failures carried by a total-failure error.
    pub fn failures(&self) -> &[AdapterFailure] {
        match self {
            Self::AllSourcesFailed { failures } | Self::NoLocalComputation { failures, .. } => {
                failures
            }
            _ => &[],
        }
    }
}

fn render(failures: &[AdapterFailure]) -> String {
    if failures.is_empty() {
        return "no tax authority configured".to_string();
    }
    failures
        .iter()
        .map(|f| format!("[{}] {}", f.adapter, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sources_failed_lists_every_failure() {
        let err = EngineError::AllSourcesFailed {
            failures: vec![
                AdapterFailure {
                    adapter: "a".into(),
                    reason: "connection refused".into(),
                },
                AdapterFailure {
                    adapter: "b".into(),
                    reason: "timed out after 30000ms".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "all tax sources failed: [a] connection refused; [b] timed out after 30000ms"
        );
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn empty_failure_list_renders_explicitly() {
        let err = EngineError::NoLocalComputation {
            category: TaxCategory::Sci,
            failures: vec![],
        };
        assert_eq!(
            err.to_string(),
            "no local computation for sci; no tax authority configured"
        );
    }
}
