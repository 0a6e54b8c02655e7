//! # Adapter Orchestrator
//!
//! Produces a [`TaxCalculationResponse`] for a request, preferring external
//! authorities and falling back to local computation.
//!
//! ## Calculation
//!
//! 1. Cache lookup by request fingerprint.
//! 2. Single-flight: concurrent callers with the same fingerprint queue on a
//!    per-fingerprint lock and re-check the cache once they hold it, so only
//!    the first one reaches the authorities. The last caller to leave the
//!    queue removes it, whether it finished or was cancelled.
//! 3. Pre-flight validation through the [`LocalCalculator`]. Rejected input
//!    never reaches an authority.
//! 4. Authorities in registration order, one at a time. The first success
//!    wins; every failure is recorded and the next authority is tried. Each
//!    attempt is bounded by the per-adapter timeout and by what remains of the
//!    overall deadline. Authorities left when the deadline passes are recorded
//!    as failed without being called.
//! 5. Local fallback when enabled, otherwise [`EngineError::AllSourcesFailed`].
//! 6. The response is cached under the fingerprint, unless the cache was
//!    cleared while it was being computed.
//!
//! ## Validation
//!
//! Fan-out, not fallback: all authorities are asked concurrently and the data
//! is valid if any one of them says so. A source that errors or times out
//! counts as `valid: false` with its error attached.
//!
//! ## Credentials
//!
//! Each authority is authenticated on first use and its credential reused.
//! A refusal ([`AuthorityError::invalidates_credential`]) discards it so the
//! next call re-authenticates.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use fisc_authority::{AuthorityError, Credential, TaxAuthority};
use fisc_core::{
    Amount, Fingerprint, TaxCalculationRequest, TaxCalculationResponse, TaxInput, Timestamp,
    LOCAL_FALLBACK_SOURCE,
};
use serde::Serialize;
use tokio::time::Instant;

use crate::cache::CalculationCache;
use crate::config::OrchestratorConfig;
use crate::error::{AdapterFailure, EngineError};
use crate::local::LocalCalculator;

/// Orchestrator behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Compute locally when every authority fails.
    pub fallback_enabled: bool,
    /// Upper bound on one authority attempt (authentication included).
    pub adapter_timeout: Duration,
    /// Upper bound on all authority attempts of one request.
    pub overall_deadline: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

impl From<&OrchestratorConfig> for OrchestratorSettings {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            fallback_enabled: config.fallback_enabled,
            adapter_timeout: config.adapter_timeout(),
            overall_deadline: config.overall_deadline(),
        }
    }
}

/// One authority's answer during multi-source validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceVerdict {
    /// Authority name.
    pub source: String,
    /// Its verdict; `false` when it errored.
    pub valid: bool,
    /// The error, if the authority failed to answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of a multi-source validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True if at least one source reported valid.
    pub is_valid: bool,
    /// One verdict per authority, in registration order.
    pub sources: Vec<SourceVerdict>,
}

/// Ordered authorities plus local fallback, cache and credential store.
pub struct AdapterOrchestrator {
    adapters: Vec<Arc<dyn TaxAuthority>>,
    credentials: DashMap<usize, Credential>,
    inflight: DashMap<Fingerprint, Arc<tokio::sync::Mutex<()>>>,
    cache: Arc<CalculationCache>,
    local: LocalCalculator,
    settings: OrchestratorSettings,
}

impl std::fmt::Debug for AdapterOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterOrchestrator")
            .field("adapters", &self.adapter_names())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AdapterOrchestrator {
    /// Orchestrator with no authorities.
    pub fn new(
        cache: Arc<CalculationCache>,
        local: LocalCalculator,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            adapters: Vec::new(),
            credentials: DashMap::new(),
            inflight: DashMap::new(),
            cache,
            local,
            settings,
        }
    }

    /// Append an authority; earlier authorities are tried first.
    pub fn add_adapter(&mut self, adapter: Arc<dyn TaxAuthority>) {
        tracing::debug!(adapter = adapter.name(), priority = self.adapters.len(), "adapter added");
        self.adapters.push(adapter);
    }

    /// Enable or disable local fallback.
    pub fn set_fallback_enabled(&mut self, enabled: bool) {
        self.settings.fallback_enabled = enabled;
    }

    /// Current settings.
    pub fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    /// Authority names in priority order.
    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Shared result cache.
    pub fn cache(&self) -> &Arc<CalculationCache> {
        &self.cache
    }

    /// Local calculator used for pre-flight validation and fallback.
    pub fn local(&self) -> &LocalCalculator {
        &self.local
    }

    /// Compute `request`, trying each authority in turn, then local fallback.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] if the input is rejected up front.
    /// - [`EngineError::AllSourcesFailed`] if every authority failed and
    ///   fallback is disabled.
    /// - [`EngineError::NoLocalComputation`] if every authority failed and
    ///   nothing local covers the category.
    pub async fn calculate_with_fallback(
        &self,
        request: &TaxCalculationRequest,
    ) -> Result<TaxCalculationResponse, EngineError> {
        let key = request.fingerprint()?;
        if let Some(hit) = self.cache.get_by_key(&key) {
            return Ok(hit);
        }

        // Declared before `gate` so it drops after it, on cancellation too.
        let _slot = InflightSlot {
            inflight: &self.inflight,
            key: &key,
        };
        let gate = self.inflight.entry(key.clone()).or_default().clone();
        let _turn = gate.lock().await;
        let result = match self.cache.get_by_key(&key) {
            Some(hit) => Ok(hit),
            None => self.compute(request, &key).await,
        };
        result
    }

    async fn compute(
        &self,
        request: &TaxCalculationRequest,
        key: &Fingerprint,
    ) -> Result<TaxCalculationResponse, EngineError> {
        let generation = self.cache.generation();
        self.local.validate(request)?;

        let deadline = Instant::now() + self.settings.overall_deadline;
        let mut failures = Vec::with_capacity(self.adapters.len());

        for (index, adapter) in self.adapters.iter().enumerate() {
            let name = adapter.name();
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(adapter = name, "overall deadline exceeded; adapter skipped");
                failures.push(AdapterFailure {
                    adapter: name.to_string(),
                    reason: format!(
                        "not attempted: overall deadline of {}ms exceeded",
                        self.settings.overall_deadline.as_millis()
                    ),
                });
                continue;
            }

            let budget = self.settings.adapter_timeout.min(deadline - now);
            let outcome = tokio::time::timeout(budget, self.attempt(index, adapter.as_ref(), request))
                .await
                .unwrap_or_else(|_| Err(timeout_error(name, budget)));

            match outcome {
                Ok(amount) => {
                    tracing::info!(
                        source = name,
                        category = %request.category(),
                        year = request.year,
                        %amount,
                        "tax calculated by authority"
                    );
                    return Ok(self.respond(key, generation, request, amount, name));
                }
                Err(e) => {
                    tracing::warn!(adapter = name, error = %e, "adapter failed; trying next source");
                    failures.push(AdapterFailure {
                        adapter: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !self.settings.fallback_enabled {
            let err = EngineError::AllSourcesFailed { failures };
            tracing::error!(error = %err, "calculation failed");
            return Err(err);
        }

        match self.local.calculate(request)? {
            Some(amount) => {
                tracing::info!(
                    source = LOCAL_FALLBACK_SOURCE,
                    category = %request.category(),
                    year = request.year,
                    %amount,
                    failed_adapters = failures.len(),
                    "tax calculated locally"
                );
                Ok(self.respond(key, generation, request, amount, LOCAL_FALLBACK_SOURCE))
            }
            None => {
                let err = EngineError::NoLocalComputation {
                    category: request.category(),
                    failures,
                };
                tracing::error!(error = %err, "calculation failed");
                Err(err)
            }
        }
    }

    fn respond(
        &self,
        key: &Fingerprint,
        generation: u64,
        request: &TaxCalculationRequest,
        amount: Amount,
        source: &str,
    ) -> TaxCalculationResponse {
        let response = TaxCalculationResponse {
            amount,
            details: request.input.clone(),
            source: source.to_string(),
            timestamp: Timestamp::now(),
        };
        self.cache
            .set_by_key_if_current(key.clone(), response.clone(), None, generation);
        response
    }

    async fn attempt(
        &self,
        index: usize,
        adapter: &dyn TaxAuthority,
        request: &TaxCalculationRequest,
    ) -> Result<Amount, AuthorityError> {
        let credential = self.credential(index, adapter).await?;
        let result = adapter.calculate_tax(&credential, request).await;
        self.discard_if_refused(index, adapter, &result);
        result
    }

    /// Ask every authority concurrently whether `input` is valid.
    ///
    /// Never fails: authority errors become `valid: false` verdicts. With no
    /// authorities the report is invalid with no sources.
    pub async fn validate_with_multiple_sources(&self, input: &TaxInput) -> ValidationReport {
        let budget = self.settings.adapter_timeout.min(self.settings.overall_deadline);
        let checks = self.adapters.iter().enumerate().map(|(index, adapter)| async move {
            let name = adapter.name();
            let outcome = tokio::time::timeout(budget, self.check(index, adapter.as_ref(), input))
                .await
                .unwrap_or_else(|_| Err(timeout_error(name, budget)));
            match outcome {
                Ok(valid) => SourceVerdict {
                    source: name.to_string(),
                    valid,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(adapter = name, error = %e, "validation source failed");
                    SourceVerdict {
                        source: name.to_string(),
                        valid: false,
                        error: Some(e.to_string()),
                    }
                }
            }
        });

        let sources = futures::future::join_all(checks).await;
        let is_valid = sources.iter().any(|s| s.valid);
        tracing::info!(
            category = %input.category(),
            is_valid,
            sources = sources.len(),
            "multi-source validation complete"
        );
        ValidationReport { is_valid, sources }
    }

    async fn check(
        &self,
        index: usize,
        adapter: &dyn TaxAuthority,
        input: &TaxInput,
    ) -> Result<bool, AuthorityError> {
        let credential = self.credential(index, adapter).await?;
        let result = adapter.validate_data(&credential, input).await;
        self.discard_if_refused(index, adapter, &result);
        result
    }

    async fn credential(
        &self,
        index: usize,
        adapter: &dyn TaxAuthority,
    ) -> Result<Credential, AuthorityError> {
        let cached = self.credentials.get(&index).map(|c| c.value().clone());
        if let Some(credential) = cached {
            return Ok(credential);
        }
        tracing::debug!(adapter = adapter.name(), "authenticating");
        let credential = adapter.authenticate().await?;
        self.credentials.insert(index, credential.clone());
        Ok(credential)
    }

    fn discard_if_refused<T>(
        &self,
        index: usize,
        adapter: &dyn TaxAuthority,
        result: &Result<T, AuthorityError>,
    ) {
        if let Err(e) = result {
            if e.invalidates_credential() && self.credentials.remove(&index).is_some() {
                tracing::debug!(adapter = adapter.name(), "credential discarded");
            }
        }
    }
}

/// A caller's place in the single-flight queue for one fingerprint. On drop,
/// removes the queue if no other caller holds its gate.
struct InflightSlot<'a> {
    inflight: &'a DashMap<Fingerprint, Arc<tokio::sync::Mutex<()>>>,
    key: &'a Fingerprint,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        self.inflight
            .remove_if(self.key, |_, gate| Arc::strong_count(gate) == 1);
    }
}

fn timeout_error(authority: &str, budget: Duration) -> AuthorityError {
    AuthorityError::Timeout {
        authority: authority.to_string(),
        elapsed_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fisc_core::WealthInput;
    use fisc_rules::{standard_rules, RuleRegistry};
    use parking_lot::RwLock;
    use rust_decimal_macros::dec;

    /// Authority whose calculations never complete.
    struct Stalled;

    #[async_trait]
    impl TaxAuthority for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn authenticate(&self) -> Result<Credential, AuthorityError> {
            Ok(Credential::Anonymous)
        }

        async fn calculate_tax(
            &self,
            _credential: &Credential,
            _request: &TaxCalculationRequest,
        ) -> Result<Amount, AuthorityError> {
            std::future::pending().await
        }

        async fn validate_data(
            &self,
            _credential: &Credential,
            _input: &TaxInput,
        ) -> Result<bool, AuthorityError> {
            std::future::pending().await
        }
    }

    fn stalled_orchestrator() -> AdapterOrchestrator {
        let registry = Arc::new(RwLock::new(RuleRegistry::with_rules(standard_rules())));
        let mut orch = AdapterOrchestrator::new(
            Arc::new(CalculationCache::default()),
            LocalCalculator::new(registry),
            OrchestratorSettings::default(),
        );
        orch.add_adapter(Arc::new(Stalled));
        orch
    }

    fn request() -> TaxCalculationRequest {
        TaxCalculationRequest::new(
            TaxInput::Wealth(WealthInput {
                net_worth: Amount::new(dec!(1500000)),
            }),
            2024,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_callers_leave_no_queue_behind() {
        let orch = stalled_orchestrator();
        let req = request();

        let mut leader = Box::pin(orch.calculate_with_fallback(&req));
        let mut waiter = Box::pin(orch.calculate_with_fallback(&req));
        assert!(futures::poll!(leader.as_mut()).is_pending());
        assert!(futures::poll!(waiter.as_mut()).is_pending());
        assert_eq!(orch.inflight.len(), 1);

        drop(leader);
        assert_eq!(orch.inflight.len(), 1, "waiter still queued");

        drop(waiter);
        assert!(orch.inflight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_calculation_leaves_no_queue_behind() {
        let orch = stalled_orchestrator();
        let response = orch.calculate_with_fallback(&request()).await.unwrap();
        assert_eq!(response.source, LOCAL_FALLBACK_SOURCE);
        assert!(orch.inflight.is_empty());
    }
}
