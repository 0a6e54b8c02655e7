//! # Engine
//!
//! Owns one rule registry, one cache and one orchestrator, wired together.
//! There is no global state: each `Engine` is independent, so tests run with
//! isolated registries and caches in parallel.

use std::sync::Arc;

use fisc_authority::{HttpTaxAuthority, TaxAuthority};
use fisc_core::{
    TaxCalculationRequest, TaxCalculationResponse, TaxCategory, TaxInput, ValidationError,
};
use fisc_rules::{standard_rules, Rule, RuleRegistry, RuleSummary};
use parking_lot::RwLock;

use crate::cache::CalculationCache;
use crate::config::{ConfigError, EngineConfig};
use crate::error::EngineError;
use crate::local::LocalCalculator;
use crate::orchestrator::{AdapterOrchestrator, OrchestratorSettings, ValidationReport};

/// Rule registry, cache and orchestrator behind one handle.
#[derive(Debug)]
pub struct Engine {
    registry: Arc<RwLock<RuleRegistry>>,
    orchestrator: AdapterOrchestrator,
}

impl Engine {
    /// Engine over `registry` with no authorities.
    pub fn new(
        registry: RuleRegistry,
        cache: Arc<CalculationCache>,
        settings: OrchestratorSettings,
    ) -> Self {
        let registry = Arc::new(RwLock::new(registry));
        let local = LocalCalculator::new(Arc::clone(&registry));
        Self {
            registry,
            orchestrator: AdapterOrchestrator::new(cache, local, settings),
        }
    }

    /// Engine with the standard rules and default settings, no authorities.
    pub fn standard() -> Self {
        Self::new(
            RuleRegistry::with_rules(standard_rules()),
            Arc::new(CalculationCache::default()),
            OrchestratorSettings::default(),
        )
    }

    /// Build from configuration, reading secrets from the process environment.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] if a secret is missing or an authority cannot
    /// be built.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::from_config_with(config, |var| std::env::var(var).ok())
    }

    /// Build from configuration, reading secrets through `lookup`.
    ///
    /// # Errors
    ///
    /// As [`Engine::from_config`].
    pub fn from_config_with(
        config: &EngineConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut engine = Self::new(
            RuleRegistry::with_rules(standard_rules()),
            Arc::new(CalculationCache::new(config.cache_ttl())),
            OrchestratorSettings::from(&config.orchestrator),
        );
        for entry in &config.authorities {
            let authority_config = entry.resolve(&lookup)?;
            let authority =
                HttpTaxAuthority::new(authority_config).map_err(|source| ConfigError::Authority {
                    name: entry.name.clone(),
                    source,
                })?;
            engine.add_authority(Arc::new(authority));
        }
        tracing::info!(
            authorities = config.authorities.len(),
            fallback_enabled = config.orchestrator.fallback_enabled,
            "engine configured"
        );
        Ok(engine)
    }

    /// Append an authority at the lowest priority.
    pub fn add_authority(&mut self, authority: Arc<dyn TaxAuthority>) {
        self.orchestrator.add_adapter(authority);
    }

    /// Enable or disable local fallback.
    pub fn set_fallback_enabled(&mut self, enabled: bool) {
        self.orchestrator.set_fallback_enabled(enabled);
    }

    /// See [`AdapterOrchestrator::calculate_with_fallback`].
    ///
    /// # Errors
    ///
    /// As [`AdapterOrchestrator::calculate_with_fallback`].
    pub async fn calculate(
        &self,
        request: &TaxCalculationRequest,
    ) -> Result<TaxCalculationResponse, EngineError> {
        self.orchestrator.calculate_with_fallback(request).await
    }

    /// See [`AdapterOrchestrator::validate_with_multiple_sources`].
    pub async fn validate(&self, input: &TaxInput) -> ValidationReport {
        self.orchestrator.validate_with_multiple_sources(input).await
    }

    /// Check `request` locally, without contacting any authority.
    ///
    /// # Errors
    ///
    /// The [`ValidationError`] of the applicable rule or simplified formula.
    pub fn validate_locally(&self, request: &TaxCalculationRequest) -> Result<(), ValidationError> {
        self.orchestrator.local().validate(request)
    }

    /// Register `rule` and clear the cache, since cached answers may have
    /// been computed under the version it replaces.
    pub fn register_rule(&self, rule: Rule) {
        self.registry.write().register(rule);
        self.orchestrator.cache().clear();
    }

    /// Summaries of the current rules, optionally filtered by category.
    pub fn rules(&self, category: Option<TaxCategory>) -> Vec<RuleSummary> {
        self.registry
            .read()
            .list(category)
            .into_iter()
            .map(Rule::summary)
            .collect()
    }

    /// Shared rule registry.
    pub fn registry(&self) -> &Arc<RwLock<RuleRegistry>> {
        &self.registry
    }

    /// Shared result cache.
    pub fn cache(&self) -> &Arc<CalculationCache> {
        self.orchestrator.cache()
    }

    /// The orchestrator.
    pub fn orchestrator(&self) -> &AdapterOrchestrator {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisc_core::{Amount, CorporateIncomeInput, WealthInput};
    use fisc_rules::{CorporateIncomeTax, CORPORATE_INCOME_RULE_ID};
    use rust_decimal_macros::dec;

    fn wealth_request(net_worth: rust_decimal::Decimal) -> TaxCalculationRequest {
        TaxCalculationRequest::new(
            TaxInput::Wealth(WealthInput {
                net_worth: Amount::new(net_worth),
            }),
            2024,
        )
    }

    #[tokio::test]
    async fn standard_engine_computes_locally() {
        let engine = Engine::standard();
        let response = engine.calculate(&wealth_request(dec!(1500000))).await.unwrap();
        assert_eq!(response.amount.value(), dec!(3900));
        assert!(response.is_local());
    }

    #[tokio::test]
    async fn register_rule_clears_cache() {
        let engine = Engine::standard();
        let request = TaxCalculationRequest::new(
            TaxInput::CorporateIncome(CorporateIncomeInput {
                taxable_profit: Amount::new(dec!(100000)),
            }),
            2024,
        );
        let first = engine.calculate(&request).await.unwrap();
        assert_eq!(first.amount.value(), dec!(20750));
        assert_eq!(engine.cache().len(), 1);

        engine.register_rule(Rule::new(
            CORPORATE_INCOME_RULE_ID,
            "Flat corporate income tax",
            CorporateIncomeTax::new(dec!(1000), dec!(30), dec!(30)),
        ));
        assert!(engine.cache().is_empty());

        let second = engine.calculate(&request).await.unwrap();
        assert_eq!(second.amount.value(), dec!(30000));
        assert_eq!(engine.registry().read().history(CORPORATE_INCOME_RULE_ID).len(), 1);
    }

    #[test]
    fn rules_filters_by_category() {
        let engine = Engine::standard();
        assert_eq!(engine.rules(None).len(), 4);
        let wealth = engine.rules(Some(TaxCategory::Wealth));
        assert_eq!(wealth.len(), 1);
        assert_eq!(wealth[0].category, TaxCategory::Wealth);
    }

    #[test]
    fn from_config_requires_secrets() {
        let config = EngineConfig::from_yaml_str(
            r#"
authorities:
  - name: books
    base_url: http://127.0.0.1:9
    auth: {scheme: api_key, api_key_env: BOOKS_KEY}
"#,
        )
        .unwrap();
        let err = Engine::from_config_with(&config, |_| None).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::MissingSecret { .. })
        ));

        let engine =
            Engine::from_config_with(&config, |_| Some("k".to_string())).unwrap();
        assert_eq!(engine.orchestrator().adapter_names(), vec!["books"]);
    }
}
